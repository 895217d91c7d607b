//! The canonical game state aggregate.
//!
//! One [`GameState`] value holds everything the simulation mutates: resource
//! balances, per-generator and per-planet state, progression sets, prestige
//! state, the event system, and play statistics. Ownership is single-writer;
//! the engine is the only mutator, so reads between intents always observe a
//! consistent snapshot.
//!
//! Collections are dense and index-aligned with the registry's registration
//! order, so `state.generators[i]` pairs with `registry.generators()[i]`.

use crate::event::EventState;
use crate::id::*;
use crate::registry::ContentRegistry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Mutable state of one generator type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratorState {
    /// Units owned. Drives cost curve position and milestone multipliers.
    pub owned: u32,
    /// A production cycle is in flight. Meaningful only with `owned > 0`.
    pub running: bool,
    /// Fraction of the current cycle elapsed, in `[0, 1)`.
    pub progress: f64,
    /// Cycles restart automatically instead of requiring a manual trigger.
    pub has_manager: bool,
    /// Total energy ever produced by this generator. Monotonic.
    pub lifetime_output: f64,
}

/// Mutable state of one planet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanetState {
    pub unlocked: bool,
}

/// Prestige currency and meta-upgrade state. Survives stellar resets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrestigeState {
    /// Stellar dust balance.
    pub dust: f64,
    /// Dust upgrade levels, index-aligned with the registry.
    pub levels: Vec<u32>,
    /// Number of stellar resets performed.
    pub times_prestiged: u32,
}

impl PrestigeState {
    /// Level of the given upgrade, zero when out of range.
    pub fn level(&self, id: DustUpgradeId) -> u32 {
        self.levels.get(id.0 as usize).copied().unwrap_or(0)
    }
}

/// Play statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    /// Manual generator runs triggered by the player.
    pub manual_runs: u64,
    /// Total seconds of active (ticked) play. Not wall-clock.
    pub playtime_seconds: f64,
}

/// Purchase batch size for generator buys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuyQuantity {
    #[default]
    One,
    Ten,
    Hundred,
    /// Buy as many as the balance affords.
    Max,
}

impl BuyQuantity {
    /// The fixed batch size, or `None` for [`BuyQuantity::Max`].
    pub fn count(self) -> Option<u32> {
        match self {
            BuyQuantity::One => Some(1),
            BuyQuantity::Ten => Some(10),
            BuyQuantity::Hundred => Some(100),
            BuyQuantity::Max => None,
        }
    }
}

/// The aggregate root: everything the simulation reads and writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// Spendable energy balance.
    pub energy: f64,
    /// Energy generated since the last prestige reset. Monotonic between
    /// resets; drives the dust-gain formula and energy achievements.
    pub lifetime_energy: f64,
    /// Derived product of planet multipliers and achievement bonuses.
    /// Recomputed by the engine after every contributing mutation; never
    /// treated as a source of truth when loading.
    pub global_multiplier: f64,
    pub generators: Vec<GeneratorState>,
    pub planets: Vec<PlanetState>,
    pub research: BTreeSet<ResearchId>,
    pub achievements: BTreeSet<AchievementId>,
    pub prestige: PrestigeState,
    pub events: EventState,
    pub stats: Statistics,
    pub buy_quantity: BuyQuantity,
    /// Wall-clock time of the last persisted checkpoint, in ms. The offline
    /// catch-up anchor. Updated when a snapshot is written.
    pub last_checkpoint_ms: u64,
}

impl GameState {
    /// A fresh first-run state sized to the registry. The event spawn time
    /// is left unscheduled; the engine schedules it.
    pub fn fresh(registry: &ContentRegistry) -> Self {
        Self {
            energy: 0.0,
            lifetime_energy: 0.0,
            global_multiplier: 1.0,
            generators: vec![GeneratorState::default(); registry.generator_count()],
            planets: vec![PlanetState::default(); registry.planet_count()],
            research: BTreeSet::new(),
            achievements: BTreeSet::new(),
            prestige: PrestigeState {
                dust: 0.0,
                levels: vec![0; registry.dust_upgrade_count()],
                times_prestiged: 0,
            },
            events: EventState::new(),
            stats: Statistics::default(),
            buy_quantity: BuyQuantity::default(),
            last_checkpoint_ms: 0,
        }
    }

    pub fn generator(&self, id: GeneratorId) -> &GeneratorState {
        &self.generators[id.0 as usize]
    }

    pub fn generator_mut(&mut self, id: GeneratorId) -> &mut GeneratorState {
        &mut self.generators[id.0 as usize]
    }

    pub fn planet(&self, id: PlanetId) -> &PlanetState {
        &self.planets[id.0 as usize]
    }

    /// Highest owned count across all generators.
    pub fn max_generator_owned(&self) -> u32 {
        self.generators.iter().map(|g| g.owned).max().unwrap_or(0)
    }

    /// Lowest owned count across all generators. Zero when there are none.
    pub fn min_generator_owned(&self) -> u32 {
        self.generators.iter().map(|g| g.owned).min().unwrap_or(0)
    }

    /// Number of unlocked planets.
    pub fn planets_unlocked(&self) -> u32 {
        self.planets.iter().filter(|p| p.unlocked).count() as u32
    }
}

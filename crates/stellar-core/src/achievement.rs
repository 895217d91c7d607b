//! Achievements: pure predicates over a state snapshot.
//!
//! Each achievement carries a [`Predicate`], a closed tagged union evaluated
//! by a small interpreter. Predicates never mutate anything and read only
//! scalar views of the state, so a sweep is cheap and safe to run at any
//! point. Unlocks are one-way set insertions; bonuses of one kind sum across
//! every unlocked achievement of that kind.

use crate::id::AchievementId;
use crate::registry::ContentRegistry;
use crate::state::GameState;
use std::collections::BTreeSet;

/// A scalar view of the game state that predicates can threshold on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateField {
    /// Energy generated since the last prestige reset.
    LifetimeEnergy,
    /// Manual generator runs triggered by the player, lifetime.
    ManualRuns,
    /// Active play time in seconds.
    PlaytimeSeconds,
    /// Highest owned count across all generators.
    MaxGeneratorOwned,
    /// Lowest owned count across all generators.
    MinGeneratorOwned,
    /// Number of unlocked planets.
    PlanetsUnlocked,
    /// Number of stellar resets performed.
    TimesPrestiged,
}

/// A pure predicate over the game state.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `field >= at_least`.
    Threshold { field: StateField, at_least: f64 },
    AllOf(Vec<Predicate>),
    AnyOf(Vec<Predicate>),
}

impl Predicate {
    pub fn eval(&self, state: &GameState) -> bool {
        match self {
            Predicate::Threshold { field, at_least } => field_value(state, *field) >= *at_least,
            Predicate::AllOf(preds) => preds.iter().all(|p| p.eval(state)),
            Predicate::AnyOf(preds) => preds.iter().any(|p| p.eval(state)),
        }
    }
}

fn field_value(state: &GameState, field: StateField) -> f64 {
    match field {
        StateField::LifetimeEnergy => state.lifetime_energy,
        StateField::ManualRuns => state.stats.manual_runs as f64,
        StateField::PlaytimeSeconds => state.stats.playtime_seconds,
        StateField::MaxGeneratorOwned => state.max_generator_owned() as f64,
        StateField::MinGeneratorOwned => state.min_generator_owned() as f64,
        StateField::PlanetsUnlocked => state.planets_unlocked() as f64,
        StateField::TimesPrestiged => state.prestige.times_prestiged as f64,
    }
}

/// The permanent bonus granted by an unlocked achievement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AchievementBonus {
    /// Additive revenue bonus fraction.
    Revenue(f64),
    /// Additive production bonus fraction.
    Production(f64),
    /// Additive global-multiplier bonus fraction.
    GlobalMult(f64),
    /// Additive generator cost reduction fraction.
    CostReduction(f64),
    /// Additive bonus fraction on computed dust gain.
    PrestigeDust(f64),
}

/// An achievement definition.
#[derive(Debug, Clone)]
pub struct AchievementDef {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub predicate: Predicate,
    pub bonus: AchievementBonus,
}

/// All achievements whose predicate now holds but that are not yet unlocked,
/// in registry order. The caller inserts them and emits notices.
pub fn newly_satisfied(
    state: &GameState,
    registry: &ContentRegistry,
    unlocked: &BTreeSet<AchievementId>,
) -> Vec<AchievementId> {
    registry
        .achievements()
        .iter()
        .enumerate()
        .filter_map(|(i, def)| {
            let id = AchievementId(i as u32);
            (!unlocked.contains(&id) && def.predicate.eval(state)).then_some(id)
        })
        .collect()
}

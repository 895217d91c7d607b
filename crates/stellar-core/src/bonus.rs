//! Bonus aggregation.
//!
//! Every multiplier source in the game funnels into one [`Bonuses`] value:
//! unlocked planets, unlocked achievements, dust upgrade levels, purchased
//! research, and the active event. The engine rebuilds the aggregate only
//! when one of those sources changes, then reads it on every tick.
//!
//! Two scopes exist. [`Bonuses::live`] includes event and research revenue
//! contributions; [`Bonuses::offline`] excludes them, since events do not
//! run while the game is closed and offline earnings are balanced around
//! the base rates.

use crate::achievement::AchievementBonus;
use crate::registry::{ContentRegistry, DustEffect, EventEffect, PlanetEffect};
use crate::research;
use crate::state::GameState;

/// Lower clamp on cycle-time reduction, both per source kind and overall.
const MIN_CYCLE_FACTOR: f64 = 0.1;

/// Lower clamp on the cost factor after reductions.
const MIN_COST_FACTOR: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Scope {
    Live,
    Offline,
}

/// Aggregated multipliers, rebuilt whenever a bonus source changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bonuses {
    /// Summed fractional discount on generator costs, uncapped here.
    /// [`crate::economy::generator_cost`] clamps the resulting factor.
    pub cost_reduction: f64,
    /// Multiplier applied to per-cycle generator revenue.
    pub output_multiplier: f64,
    /// Multiplier applied to generator cycle times, clamped to
    /// [`MIN_CYCLE_FACTOR`].
    pub cycle_time_multiplier: f64,
    /// Multiplier applied to offline earnings.
    pub offline_efficiency: f64,
    /// Product of unlocked planet multipliers and achievement global bonuses.
    pub global_multiplier: f64,
    /// Extra seconds added to event durations.
    pub event_duration_bonus: f64,
    /// Additive fraction applied to computed dust gain.
    pub prestige_dust_bonus: f64,
}

impl Default for Bonuses {
    fn default() -> Self {
        Bonuses {
            cost_reduction: 0.0,
            output_multiplier: 1.0,
            cycle_time_multiplier: 1.0,
            offline_efficiency: 1.0,
            global_multiplier: 1.0,
            event_duration_bonus: 0.0,
            prestige_dust_bonus: 0.0,
        }
    }
}

impl Bonuses {
    /// Aggregate for the running game, including event and research
    /// revenue contributions.
    pub fn live(state: &GameState, registry: &ContentRegistry) -> Self {
        Self::collect(state, registry, Scope::Live)
    }

    /// Aggregate for offline catch-up. Events and research revenue
    /// multipliers are omitted; offline efficiency sources still apply.
    pub fn offline(state: &GameState, registry: &ContentRegistry) -> Self {
        Self::collect(state, registry, Scope::Offline)
    }

    fn collect(state: &GameState, registry: &ContentRegistry, scope: Scope) -> Self {
        let mut cost_reduction = 0.0;
        let mut revenue_sum = 0.0;
        let mut production_sum = 0.0;
        let mut global_sum = 0.0;
        let mut planet_revenue_sum = 0.0;
        let mut cycle_planet_sum = 0.0;
        let mut cycle_dust_sum = 0.0;
        let mut offline_sum = 0.0;
        let mut dust_revenue_sum = 0.0;
        let mut event_duration_bonus = 0.0;
        let mut prestige_dust_bonus = 0.0;
        let mut global_multiplier = 1.0;

        for (i, def) in registry.planets().iter().enumerate() {
            if !state.planets[i].unlocked {
                continue;
            }
            global_multiplier *= def.multiplier;
            match def.effect {
                PlanetEffect::CycleSpeed(v) => cycle_planet_sum += v,
                PlanetEffect::OfflineEfficiency(v) => offline_sum += v,
                PlanetEffect::CostReduction(v) => cost_reduction += v,
                PlanetEffect::RevenueBoost(v) => planet_revenue_sum += v,
                PlanetEffect::EventDuration(v) => event_duration_bonus += v,
            }
        }

        for id in &state.achievements {
            match registry.achievement(*id).bonus {
                AchievementBonus::Revenue(v) => revenue_sum += v,
                AchievementBonus::Production(v) => production_sum += v,
                AchievementBonus::GlobalMult(v) => global_sum += v,
                AchievementBonus::CostReduction(v) => cost_reduction += v,
                AchievementBonus::PrestigeDust(v) => prestige_dust_bonus += v,
            }
        }

        for (i, def) in registry.dust_upgrades().iter().enumerate() {
            let level = state.prestige.level(crate::id::DustUpgradeId(i as u32));
            if level == 0 {
                continue;
            }
            let total = f64::from(level);
            match def.effect {
                DustEffect::StartingEnergy(_) => {}
                DustEffect::CycleSpeed(v) => cycle_dust_sum += v * total,
                DustEffect::Revenue(v) => dust_revenue_sum += v * total,
                DustEffect::OfflineEfficiency(v) => offline_sum += v * total,
                DustEffect::CostReduction(v) => cost_reduction += v * total,
            }
        }

        let mut output_multiplier = (1.0 + planet_revenue_sum)
            * (1.0 + production_sum)
            * (1.0 + revenue_sum)
            * (1.0 + dust_revenue_sum);

        if scope == Scope::Live {
            output_multiplier *= research::revenue_multiplier(&state.research, registry);
            if let Some(active) = &state.events.active {
                match registry.event(active.event).effect {
                    EventEffect::Production(v) | EventEffect::Revenue(v) => {
                        output_multiplier *= v;
                    }
                    EventEffect::CostReduction(v) => cost_reduction += v,
                }
            }
        }

        offline_sum += research::offline_bonus(&state.research, registry);

        global_multiplier *= 1.0 + global_sum;

        let cycle_time_multiplier = ((1.0 - cycle_planet_sum).max(MIN_CYCLE_FACTOR)
            * (1.0 - cycle_dust_sum).max(MIN_CYCLE_FACTOR))
        .max(MIN_CYCLE_FACTOR);

        Bonuses {
            cost_reduction,
            output_multiplier,
            cycle_time_multiplier,
            offline_efficiency: 1.0 + offline_sum,
            global_multiplier,
            event_duration_bonus,
            prestige_dust_bonus,
        }
    }

    /// The clamped factor generator costs are scaled by.
    pub fn cost_factor(&self) -> f64 {
        (1.0 - self.cost_reduction).max(MIN_COST_FACTOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ActiveEvent;
    use crate::state::GameState;
    use crate::test_utils::*;

    fn close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn fresh_state_is_neutral() {
        let registry = small_registry();
        let state = GameState::fresh(&registry);
        let b = Bonuses::live(&state, &registry);
        assert_eq!(b, Bonuses::default());
    }

    #[test]
    fn planet_effects_fold_into_their_slots() {
        let registry = small_registry();
        let mut state = GameState::fresh(&registry);

        // mars: x1.5 global, 10% cycle speed.
        let mars = registry.planet_id("mars").unwrap();
        state.planets[mars.0 as usize].unlocked = true;
        let b = Bonuses::live(&state, &registry);
        close(b.global_multiplier, 1.5);
        close(b.cycle_time_multiplier, 0.9);

        // venus stacks: x2 global, +0.5 offline efficiency.
        let venus = registry.planet_id("venus").unwrap();
        state.planets[venus.0 as usize].unlocked = true;
        let b = Bonuses::live(&state, &registry);
        close(b.global_multiplier, 3.0);
        close(b.offline_efficiency, 1.5);
    }

    #[test]
    fn planet_revenue_boost_multiplies_output() {
        let registry = small_registry();
        let mut state = GameState::fresh(&registry);
        let titan = registry.planet_id("titan").unwrap();
        state.planets[titan.0 as usize].unlocked = true;
        let b = Bonuses::live(&state, &registry);
        close(b.output_multiplier, 1.3);
        close(b.global_multiplier, 5.0);
    }

    #[test]
    fn achievement_bonuses_sum_within_kind() {
        let registry = small_registry();
        let mut state = GameState::fresh(&registry);
        state
            .achievements
            .insert(registry.achievement_id("energy_1k").unwrap());
        state
            .achievements
            .insert(registry.achievement_id("run_100").unwrap());

        let b = Bonuses::live(&state, &registry);
        // energy_1k: +5% production; run_100: +10% revenue.
        close(b.output_multiplier, 1.05 * 1.10);
    }

    #[test]
    fn dust_levels_scale_linearly() {
        let registry = small_registry();
        let mut state = GameState::fresh(&registry);
        let speed = registry.dust_upgrade_id("dust_speed").unwrap();
        let revenue = registry.dust_upgrade_id("dust_revenue").unwrap();
        state.prestige.levels[speed.0 as usize] = 3;
        state.prestige.levels[revenue.0 as usize] = 2;

        let b = Bonuses::live(&state, &registry);
        close(b.cycle_time_multiplier, 1.0 - 0.05 * 3.0);
        close(b.output_multiplier, 1.0 + 0.25 * 2.0);
    }

    #[test]
    fn cycle_time_clamps_at_floor() {
        let registry = small_registry();
        let mut state = GameState::fresh(&registry);
        let speed = registry.dust_upgrade_id("dust_speed").unwrap();
        // 30 levels at 5% would reach -50%; the factor clamps instead.
        state.prestige.levels[speed.0 as usize] = 30;

        let b = Bonuses::live(&state, &registry);
        close(b.cycle_time_multiplier, 0.1);
    }

    #[test]
    fn research_revenue_applies_live_only() {
        let registry = small_registry();
        let mut state = GameState::fresh(&registry);
        unlock_research_chain(&mut state, &registry, "res_revenue_boost");

        let live = Bonuses::live(&state, &registry);
        let offline = Bonuses::offline(&state, &registry);
        close(live.output_multiplier, 1.2);
        close(offline.output_multiplier, 1.0);
    }

    #[test]
    fn research_offline_bonus_applies_in_both_scopes() {
        let registry = small_registry();
        let mut state = GameState::fresh(&registry);
        unlock_research_chain(&mut state, &registry, "res_offline");

        let live = Bonuses::live(&state, &registry);
        let offline = Bonuses::offline(&state, &registry);
        close(live.offline_efficiency, 1.5);
        close(offline.offline_efficiency, 1.5);
    }

    #[test]
    fn active_event_applies_live_only() {
        let registry = small_registry();
        let mut state = GameState::fresh(&registry);
        let flare = registry.event_id("solar_flare").unwrap();
        state.events.active = Some(ActiveEvent {
            event: flare,
            activated_at: 0,
            ends_at: 30_000,
        });

        let live = Bonuses::live(&state, &registry);
        let offline = Bonuses::offline(&state, &registry);
        close(live.output_multiplier, 2.0);
        close(offline.output_multiplier, 1.0);
    }

    #[test]
    fn cost_reduction_event_feeds_cost_factor() {
        let registry = small_registry();
        let mut state = GameState::fresh(&registry);
        let wormhole = registry.event_id("wormhole").unwrap();
        state.events.active = Some(ActiveEvent {
            event: wormhole,
            activated_at: 0,
            ends_at: 45_000,
        });

        let b = Bonuses::live(&state, &registry);
        close(b.cost_reduction, 0.30);
        close(b.cost_factor(), 0.70);
        close(b.output_multiplier, 1.0);
    }

    #[test]
    fn cost_factor_clamps_at_floor() {
        let b = Bonuses {
            cost_reduction: 1.5,
            ..Bonuses::default()
        };
        close(b.cost_factor(), 0.1);
    }
}

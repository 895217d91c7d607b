//! Shared test helpers for unit tests, integration tests, and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::achievement::{AchievementBonus, AchievementDef, Predicate, StateField};
use crate::engine::GameEngine;
use crate::id::ResearchId;
use crate::registry::*;
use crate::state::GameState;

/// Fixed wall-clock origin for engine tests, in milliseconds.
pub const START_MS: u64 = 1_000_000;

// ===========================================================================
// Definition constructors
// ===========================================================================

pub fn generator_def(
    name: &str,
    base_cost: f64,
    cost_scaling: f64,
    base_revenue: f64,
    cycle_time: f64,
) -> GeneratorDef {
    GeneratorDef {
        name: name.to_string(),
        display_name: name.to_string(),
        description: String::new(),
        base_cost,
        cost_scaling,
        base_revenue,
        cycle_time,
        manager_cost: 1_000.0,
    }
}

pub fn planet_def(name: &str, unlock_cost: f64, multiplier: f64, effect: PlanetEffect) -> PlanetDef {
    PlanetDef {
        name: name.to_string(),
        display_name: name.to_string(),
        description: String::new(),
        unlock_cost,
        multiplier,
        effect,
    }
}

pub fn research_def(
    name: &str,
    cost: f64,
    requires: Vec<ResearchId>,
    effect: ResearchEffect,
) -> ResearchDef {
    ResearchDef {
        name: name.to_string(),
        display_name: name.to_string(),
        description: String::new(),
        cost,
        requires,
        effect,
    }
}

pub fn dust_def(name: &str, base_cost: f64, max_level: u32, effect: DustEffect) -> DustUpgradeDef {
    DustUpgradeDef {
        name: name.to_string(),
        display_name: name.to_string(),
        description: String::new(),
        base_cost,
        max_level,
        effect,
    }
}

pub fn event_def(name: &str, duration: f64, effect: EventEffect) -> EventDef {
    EventDef {
        name: name.to_string(),
        display_name: name.to_string(),
        description: String::new(),
        duration,
        effect,
    }
}

pub fn achievement_def(name: &str, predicate: Predicate, bonus: AchievementBonus) -> AchievementDef {
    AchievementDef {
        name: name.to_string(),
        display_name: name.to_string(),
        description: String::new(),
        predicate,
        bonus,
    }
}

fn at_least(field: StateField, threshold: f64) -> Predicate {
    Predicate::Threshold {
        field,
        at_least: threshold,
    }
}

// ===========================================================================
// Content fixture
// ===========================================================================

/// A small but complete registry covering every content kind and effect
/// family. Numbers are chosen so test arithmetic stays exact.
pub fn small_registry() -> ContentRegistry {
    let mut b = ContentRegistryBuilder::new();

    b.register_generator(generator_def("solar_panel", 4.0, 1.07, 1.0, 0.6))
        .unwrap();
    b.register_generator(generator_def("wind_turbine", 60.0, 1.15, 60.0, 3.0))
        .unwrap();
    b.register_generator(generator_def("fusion_reactor", 720.0, 1.14, 540.0, 6.0))
        .unwrap();

    b.register_planet(planet_def("mars", 250.0, 1.5, PlanetEffect::CycleSpeed(0.10)))
        .unwrap();
    b.register_planet(planet_def(
        "venus",
        5_000.0,
        2.0,
        PlanetEffect::OfflineEfficiency(0.50),
    ))
    .unwrap();
    b.register_planet(planet_def(
        "europa",
        50_000.0,
        3.0,
        PlanetEffect::CostReduction(0.10),
    ))
    .unwrap();
    b.register_planet(planet_def(
        "titan",
        500_000.0,
        5.0,
        PlanetEffect::RevenueBoost(0.30),
    ))
    .unwrap();

    let auto_run = b
        .register_research(research_def("res_auto_run", 500.0, vec![], ResearchEffect::AutoRunAll))
        .unwrap();
    let bulk_buy = b
        .register_research(research_def("res_bulk_buy", 750.0, vec![], ResearchEffect::BulkBuy))
        .unwrap();
    let offline = b
        .register_research(research_def(
            "res_offline",
            2_000.0,
            vec![auto_run],
            ResearchEffect::OfflineEfficiency(0.5),
        ))
        .unwrap();
    let refund = b
        .register_research(research_def(
            "res_planet_refund",
            5_000.0,
            vec![bulk_buy],
            ResearchEffect::PlanetRefund(0.25),
        ))
        .unwrap();
    let revenue = b
        .register_research(research_def(
            "res_revenue_boost",
            8_000.0,
            vec![offline],
            ResearchEffect::RevenueMultiplier(1.2),
        ))
        .unwrap();
    b.register_research(research_def(
        "res_tier2_unlock",
        10_000.0,
        vec![offline],
        ResearchEffect::GeneratorTierUnlock(2),
    ))
    .unwrap();
    b.register_research(research_def(
        "res_prestige_boost",
        20_000.0,
        vec![revenue, refund],
        ResearchEffect::PrestigeMultiplier(1.15),
    ))
    .unwrap();

    b.register_dust_upgrade(dust_def("dust_starting", 20.0, 20, DustEffect::StartingEnergy(100.0)))
        .unwrap();
    b.register_dust_upgrade(dust_def("dust_speed", 30.0, 10, DustEffect::CycleSpeed(0.05)))
        .unwrap();
    b.register_dust_upgrade(dust_def("dust_revenue", 50.0, 10, DustEffect::Revenue(0.25)))
        .unwrap();
    b.register_dust_upgrade(dust_def(
        "dust_offline",
        60.0,
        10,
        DustEffect::OfflineEfficiency(0.20),
    ))
    .unwrap();
    b.register_dust_upgrade(dust_def("dust_cost", 75.0, 5, DustEffect::CostReduction(0.05)))
        .unwrap();

    b.register_event(event_def("solar_flare", 30.0, EventEffect::Production(2.0)))
        .unwrap();
    b.register_event(event_def("wormhole", 45.0, EventEffect::CostReduction(0.30)))
        .unwrap();

    b.register_achievement(achievement_def(
        "energy_1k",
        at_least(StateField::LifetimeEnergy, 1_000.0),
        AchievementBonus::Production(0.05),
    ))
    .unwrap();
    b.register_achievement(achievement_def(
        "first_generator",
        at_least(StateField::MaxGeneratorOwned, 1.0),
        AchievementBonus::CostReduction(0.02),
    ))
    .unwrap();
    b.register_achievement(achievement_def(
        "first_planet",
        at_least(StateField::PlanetsUnlocked, 1.0),
        AchievementBonus::Revenue(0.05),
    ))
    .unwrap();
    b.register_achievement(achievement_def(
        "first_prestige",
        at_least(StateField::TimesPrestiged, 1.0),
        AchievementBonus::PrestigeDust(0.10),
    ))
    .unwrap();
    b.register_achievement(achievement_def(
        "run_100",
        at_least(StateField::ManualRuns, 100.0),
        AchievementBonus::Revenue(0.10),
    ))
    .unwrap();
    b.register_achievement(achievement_def(
        "all_generators",
        at_least(StateField::MinGeneratorOwned, 1.0),
        AchievementBonus::Production(0.10),
    ))
    .unwrap();
    b.register_achievement(achievement_def(
        "hour_played",
        at_least(StateField::PlaytimeSeconds, 3_600.0),
        AchievementBonus::GlobalMult(0.05),
    ))
    .unwrap();

    b.build().unwrap()
}

// ===========================================================================
// State helpers
// ===========================================================================

/// Insert a research node along with its full prerequisite closure.
pub fn unlock_research_chain(state: &mut GameState, registry: &ContentRegistry, name: &str) {
    let mut stack = vec![registry.research_id(name).unwrap()];
    while let Some(id) = stack.pop() {
        if state.research.insert(id) {
            stack.extend(registry.research(id).requires.iter().copied());
        }
    }
}

// ===========================================================================
// Engine helpers
// ===========================================================================

pub fn new_engine() -> GameEngine {
    GameEngine::new(small_registry(), 42, START_MS)
}

pub fn engine_with_energy(energy: f64) -> GameEngine {
    let mut engine = new_engine();
    engine.state.energy = energy;
    engine
}

//! Headless early-game campaign over the canonical content set.
//!
//! Drives a real engine through the first session arc: funding the first
//! generators, manual cycles, milestone doubling, manager automation,
//! research gates, planet unlocks, and the timed event lifecycle. Every
//! scenario runs on the shipped data files, so these tests also pin the
//! canonical numbers the frontend is balanced around.

use stellar_core::bonus::Bonuses;
use stellar_core::economy::BuyAmount;
use stellar_core::engine::GameEngine;
use stellar_core::event::{EVENT_OFFER_WINDOW_MS, EVENT_SPAWN_MAX_MS, EVENT_SPAWN_MIN_MS};
use stellar_core::id::GeneratorId;
use stellar_core::notify::Notice;
use stellar_core::registry::{ContentRegistry, EventEffect};
use stellar_core::state::BuyQuantity;
use stellar_data::canonical_registry;

// ===========================================================================
// Shared helpers
// ===========================================================================

/// Wall-clock origin for every scenario, in milliseconds.
const START_MS: u64 = 1_700_000_000_000;

fn registry() -> ContentRegistry {
    // RUST_LOG=stellar_core=debug surfaces engine logs in failing runs.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    canonical_registry().expect("canonical content should load")
}

fn new_session(seed: u64) -> GameEngine {
    GameEngine::new(registry(), seed, START_MS)
}

/// Engine with a funded balance, as if restored from an earlier session.
fn funded_session(seed: u64, energy: f64) -> GameEngine {
    let mut engine = new_session(seed);
    engine.state.energy = energy;
    engine
}

fn generator(engine: &GameEngine, name: &str) -> GeneratorId {
    engine
        .registry
        .generator_id(name)
        .unwrap_or_else(|| panic!("canonical generator {name} missing"))
}

// ===========================================================================
// Test 1: Fresh session
// ===========================================================================

/// A new run starts with nothing: no energy, no generators, and an event
/// spawn already scheduled inside the spawn window.
#[test]
fn fresh_session_starts_empty() {
    let engine = new_session(42);

    assert_eq!(engine.state.energy, 0.0);
    assert_eq!(engine.state.lifetime_energy, 0.0);
    assert_eq!(engine.state.generators.len(), 8);
    assert!(engine.state.generators.iter().all(|g| g.owned == 0));
    assert!(engine.state.research.is_empty());
    assert!(engine.state.achievements.is_empty());
    assert_eq!(engine.state.prestige.dust, 0.0);
    assert_eq!(*engine.bonuses(), Bonuses::default());

    let next = engine.state.events.next_spawn_at;
    assert!(next >= START_MS + EVENT_SPAWN_MIN_MS, "spawn scheduled too early: {next}");
    assert!(next < START_MS + EVENT_SPAWN_MAX_MS, "spawn scheduled too late: {next}");

    // Nothing is affordable on an empty balance.
    let solar = generator(&engine, "solar_panel");
    assert_eq!(engine.generator_cost(solar), 4.0);
    assert_eq!(engine.generator_buy_preview(solar), BuyAmount::zero());
}

// ===========================================================================
// Test 2: First purchase and manual cycle
// ===========================================================================

/// Buying the first solar panel and running one manual cycle credits
/// exactly the base revenue. The first-unit achievement lands on the buy
/// and discounts the next unit.
#[test]
fn first_purchase_and_manual_cycle() {
    let mut engine = funded_session(42, 100.0);
    let solar = generator(&engine, "solar_panel");
    let wind = generator(&engine, "wind_turbine");

    let preview = engine.generator_buy_preview(solar);
    assert_eq!(preview.count, 1);
    assert_eq!(preview.total_cost, 4.0);
    let executed = engine.buy_generator(solar, START_MS);
    assert_eq!(executed, preview, "executed buy should match the preview");
    assert_eq!(engine.state.energy, 96.0);
    assert_eq!(engine.state.generator(solar).owned, 1);

    // The buy satisfied the first-unit achievement: 2% off, so the second
    // unit costs floor(floor(4 * 1.07) * 0.98) = 3.
    let first = engine.registry.achievement_id("first_generator").unwrap();
    assert!(engine.state.achievements.contains(&first));
    assert_eq!(engine.generator_cost(solar), 3.0);
    assert!(
        engine
            .notices
            .iter()
            .any(|p| p.notice == Notice::AchievementUnlocked { achievement: first })
    );

    // Unowned generators cannot be run; owned ones run once at a time.
    assert!(!engine.run_generator(wind));
    assert!(engine.run_generator(solar));
    assert!(!engine.run_generator(solar));
    assert_eq!(engine.state.stats.manual_runs, 1);

    // One 0.6s cycle of one panel pays base revenue 1.
    engine.tick(0.6, START_MS + 600);
    assert!(!engine.state.generator(solar).running);
    assert_eq!(engine.state.energy, 97.0);
    assert_eq!(engine.state.lifetime_energy, 1.0);
}

// ===========================================================================
// Test 3: Milestone doubling
// ===========================================================================

/// The 25th unit crosses the first milestone and doubles per-cycle output.
#[test]
fn milestone_at_25_doubles_revenue() {
    let mut engine = funded_session(42, 10_000.0);
    let solar = generator(&engine, "solar_panel");

    while engine.state.generator(solar).owned < 24 {
        let plan = engine.buy_generator(solar, START_MS);
        assert!(plan.count > 0, "buy should stay affordable");
    }
    assert_eq!(engine.next_milestone(solar).map(|m| m.threshold), Some(25));

    assert_eq!(engine.buy_generator(solar, START_MS).count, 1);
    assert_eq!(engine.next_milestone(solar).map(|m| m.threshold), Some(50));

    // 25 units at base 1.0, doubled once by the milestone.
    assert!(engine.run_generator(solar));
    let before = engine.state.energy;
    engine.tick(0.6, START_MS + 600);
    assert!(
        (engine.state.energy - before - 50.0).abs() < 1e-9,
        "expected one 50-energy cycle, got {}",
        engine.state.energy - before
    );
}

// ===========================================================================
// Test 4: Manager automation
// ===========================================================================

/// A managed turbine keeps cycling without manual runs and rolls straight
/// into the next cycle.
#[test]
fn managers_keep_generators_cycling() {
    let mut engine = funded_session(42, 20_000.0);
    let wind = generator(&engine, "wind_turbine");

    assert_eq!(engine.buy_generator(wind, START_MS).count, 1);
    assert!(engine.buy_manager(wind));
    assert_eq!(engine.state.energy, 20_000.0 - 60.0 - 15_000.0);
    assert!(engine.state.generator(wind).running, "manager should start the cycle");

    // Managed generators refuse manual runs.
    assert!(!engine.run_generator(wind));

    // Four 0.75s ticks complete one 3s cycle worth 60.
    let mut now = START_MS;
    for _ in 0..4 {
        now += 750;
        engine.tick(0.75, now);
    }
    assert_eq!(engine.state.energy, 5_000.0);
    assert!(engine.state.generator(wind).running, "cycle should restart itself");

    // And the next cycle follows without any input.
    for _ in 0..4 {
        now += 750;
        engine.tick(0.75, now);
    }
    assert_eq!(engine.state.energy, 5_060.0);
    assert_eq!(engine.state.generator(wind).lifetime_output, 120.0);
}

// ===========================================================================
// Test 5: Auto-run research
// ===========================================================================

/// With auto-run researched, one manual run starts every idle generator.
#[test]
fn auto_run_research_starts_all_idle_generators() {
    let mut engine = funded_session(42, 5_000.0);
    let solar = generator(&engine, "solar_panel");
    let wind = generator(&engine, "wind_turbine");
    engine.buy_generator(solar, START_MS);
    engine.buy_generator(wind, START_MS);

    let auto_run = engine.registry.research_id("res_auto_run").unwrap();
    assert!(engine.purchase_research(auto_run, START_MS));

    assert!(engine.run_generator(solar));
    assert!(engine.state.generator(solar).running);
    assert!(engine.state.generator(wind).running, "auto-run should start the turbine too");
    assert_eq!(engine.state.stats.manual_runs, 1);
}

// ===========================================================================
// Test 6: Bulk buy research
// ===========================================================================

/// Batch sizes above one only take effect once bulk buy is researched;
/// until then the quantity silently falls back to a single unit.
#[test]
fn bulk_buy_requires_research() {
    let mut engine = funded_session(42, 10_000.0);
    let solar = generator(&engine, "solar_panel");

    engine.set_buy_quantity(BuyQuantity::Ten);
    assert_eq!(engine.buy_generator(solar, START_MS).count, 1);

    let bulk = engine.registry.research_id("res_bulk_buy").unwrap();
    assert!(engine.purchase_research(bulk, START_MS));
    assert_eq!(engine.buy_generator(solar, START_MS).count, 10);
    assert_eq!(engine.state.generator(solar).owned, 11);
}

// ===========================================================================
// Test 7: Research prerequisites
// ===========================================================================

/// Research nodes gate on their prerequisites even when affordable, and an
/// owned node cannot be bought twice.
#[test]
fn research_prerequisites_gate_purchases() {
    let mut engine = funded_session(42, 2_500.0);
    let auto_run = engine.registry.research_id("res_auto_run").unwrap();
    let offline = engine.registry.research_id("res_offline").unwrap();

    assert!(!engine.can_research(offline));
    assert!(!engine.purchase_research(offline, START_MS));

    assert!(engine.purchase_research(auto_run, START_MS));
    assert_eq!(engine.state.energy, 2_000.0);

    assert!(engine.can_research(offline));
    assert!(engine.purchase_research(offline, START_MS));
    assert_eq!(engine.state.energy, 0.0);

    engine.state.energy = 10_000.0;
    assert!(!engine.purchase_research(auto_run, START_MS));
}

// ===========================================================================
// Test 8: Tier-gated generators
// ===========================================================================

/// Tier-two generators refuse purchase until the unlock node is researched,
/// regardless of the balance.
#[test]
fn tier_two_generators_unlock_via_research() {
    let mut engine = funded_session(42, 2_000_000.0);
    let dark = generator(&engine, "dark_energy_tap");
    let dyson = generator(&engine, "dyson_sphere");

    assert_eq!(engine.buy_generator(dark, START_MS), BuyAmount::zero());
    assert_eq!(engine.generator_buy_preview(dyson), BuyAmount::zero());

    for name in ["res_auto_run", "res_offline", "res_tier2_unlock"] {
        let id = engine.registry.research_id(name).unwrap();
        assert!(engine.purchase_research(id, START_MS), "{name} should purchase");
    }
    assert_eq!(engine.state.energy, 2_000_000.0 - 500.0 - 2_000.0 - 10_000.0);

    let bought = engine.buy_generator(dark, START_MS);
    assert_eq!(bought.count, 1);
    assert_eq!(bought.total_cost, 1_244_160.0);
    assert_eq!(engine.state.generator(dark).owned, 1);
}

// ===========================================================================
// Test 9: Planet unlocks
// ===========================================================================

/// Unlocking Mars multiplies all production and speeds up cycles; the
/// first-planet achievement stacks its own global bonus on top.
#[test]
fn planet_unlock_scales_production() {
    let mut engine = funded_session(42, 300.0);
    let solar = generator(&engine, "solar_panel");
    let mars = engine.registry.planet_id("mars").unwrap();

    engine.buy_generator(solar, START_MS);
    assert!(engine.can_unlock_planet(mars));
    assert!(engine.unlock_planet(mars, START_MS));
    assert!(!engine.unlock_planet(mars, START_MS), "planets unlock once");
    assert_eq!(engine.state.energy, 46.0);

    // Mars x1.5, first-planet achievement +5%: 1.5 * 1.05.
    assert!((engine.state.global_multiplier - 1.575).abs() < 1e-9);
    assert!((engine.bonuses().cycle_time_multiplier - 0.9).abs() < 1e-9);

    // The 0.6s tick now overshoots the 0.54s cycle and still pays once.
    assert!(engine.run_generator(solar));
    let before = engine.state.energy;
    engine.tick(0.6, START_MS + 600);
    assert!((engine.state.energy - before - 1.575).abs() < 1e-9);
}

// ===========================================================================
// Test 10: Planet refund research
// ===========================================================================

/// Researched colonial subsidies refund a quarter of a planet's unlock cost.
#[test]
fn planet_refund_research_returns_part_of_cost() {
    let mut engine = funded_session(42, 20_000.0);
    let bulk = engine.registry.research_id("res_bulk_buy").unwrap();
    let refund = engine.registry.research_id("res_planet_refund").unwrap();
    assert!(engine.purchase_research(bulk, START_MS));
    assert!(engine.purchase_research(refund, START_MS));

    let venus = engine.registry.planet_id("venus").unwrap();
    assert!(engine.unlock_planet(venus, START_MS));
    // 20_000 - 750 - 5_000 research, then 5_000 paid and 1_250 back.
    assert_eq!(engine.state.energy, 10_500.0);
    assert!((engine.state.global_multiplier - 2.0 * 1.05).abs() < 1e-9);
}

// ===========================================================================
// Test 11: Manual-run achievement
// ===========================================================================

/// A hundred manual runs unlock the first click achievement, which boosts
/// revenue by 10% from then on.
#[test]
fn hundred_manual_runs_unlock_revenue_bonus() {
    let mut engine = funded_session(42, 50.0);
    let solar = generator(&engine, "solar_panel");
    engine.buy_generator(solar, START_MS);

    let mut now = START_MS;
    for _ in 0..100 {
        assert!(engine.run_generator(solar));
        now += 600;
        engine.tick(0.6, now);
    }
    assert_eq!(engine.state.stats.manual_runs, 100);
    // Each of the 100 cycles paid exactly 1.
    assert_eq!(engine.state.lifetime_energy, 100.0);

    // Any purchase re-checks achievements; the run counter qualifies now.
    assert_eq!(engine.buy_generator(solar, now).count, 1);
    let run_100 = engine.registry.achievement_id("run_100").unwrap();
    assert!(engine.state.achievements.contains(&run_100));

    // Two panels at +10% revenue: 2.2 per cycle.
    assert!(engine.run_generator(solar));
    let before = engine.state.energy;
    now += 600;
    engine.tick(0.6, now);
    assert!((engine.state.energy - before - 2.2).abs() < 1e-9);
}

// ===========================================================================
// Test 12: Event offer lifecycle
// ===========================================================================

/// An event offer spawns at its scheduled time, can be accepted inside the
/// window, applies its modifier while active, and drops off on expiry.
#[test]
fn event_offer_activates_and_expires() {
    let mut engine = new_session(42);
    let spawn_at = engine.state.events.next_spawn_at;

    engine.tick(0.5, spawn_at - 1);
    assert!(engine.state.events.pending.is_none());

    engine.tick(0.5, spawn_at);
    let pending = engine.state.events.pending.expect("offer should spawn");
    assert_eq!(pending.spawned_at, spawn_at);
    assert_eq!(pending.expires_at, spawn_at + EVENT_OFFER_WINDOW_MS);
    assert!(engine.state.events.next_spawn_at > spawn_at, "next spawn should reschedule");
    assert!(
        engine
            .notices
            .iter()
            .any(|p| matches!(p.notice, Notice::EventOffered { .. }))
    );

    // Accept inside the window; the modifier matches the definition.
    let accepted_at = spawn_at + 1_000;
    assert!(engine.activate_event(accepted_at));
    let active = engine.state.events.active.expect("event should be active");
    let def = engine.registry.event(active.event);
    assert_eq!(active.ends_at, accepted_at + (def.duration * 1_000.0) as u64);
    match def.effect {
        EventEffect::Production(v) | EventEffect::Revenue(v) => {
            assert!((engine.bonuses().output_multiplier - v).abs() < 1e-9);
        }
        EventEffect::CostReduction(v) => {
            assert!((engine.bonuses().cost_reduction - v).abs() < 1e-9);
        }
    }

    // The modifier drops off once the duration elapses.
    engine.tick(0.5, active.ends_at);
    assert!(engine.state.events.active.is_none());
    assert_eq!(*engine.bonuses(), Bonuses::default());
}

// ===========================================================================
// Test 13: Ignored and declined offers
// ===========================================================================

/// Unanswered offers lapse at the end of the acceptance window; the next
/// offer can be declined outright.
#[test]
fn unanswered_offers_lapse_and_dismiss() {
    let mut engine = new_session(7);
    let spawn_at = engine.state.events.next_spawn_at;

    engine.tick(0.5, spawn_at);
    assert!(engine.state.events.pending.is_some());

    engine.tick(0.5, spawn_at + EVENT_OFFER_WINDOW_MS);
    assert!(engine.state.events.pending.is_none(), "ignored offer should lapse");
    assert!(!engine.activate_event(spawn_at + EVENT_OFFER_WINDOW_MS + 1));

    // The reschedule from the first spawn still delivers the next offer.
    let second_spawn = engine.state.events.next_spawn_at;
    engine.tick(0.5, second_spawn);
    assert!(engine.state.events.pending.is_some());
    assert!(engine.dismiss_event());
    assert!(engine.state.events.pending.is_none());
    assert!(!engine.dismiss_event());
}

// ===========================================================================
// Test 14: Event duration planet bonus
// ===========================================================================

/// Proxima b stretches every activated event by 15 seconds.
#[test]
fn proxima_extends_event_durations() {
    let mut engine = funded_session(42, 6_000_000.0);
    let proxima = engine.registry.planet_id("proxima_b").unwrap();
    assert!(engine.unlock_planet(proxima, START_MS));
    assert!((engine.bonuses().event_duration_bonus - 15.0).abs() < 1e-9);

    let spawn_at = engine.state.events.next_spawn_at;
    engine.tick(0.5, spawn_at);
    assert!(engine.state.events.pending.is_some());

    let accepted_at = spawn_at + 500;
    assert!(engine.activate_event(accepted_at));
    let active = engine.state.events.active.expect("event should be active");
    let base = engine.registry.event(active.event).duration;
    assert_eq!(active.ends_at, accepted_at + ((base + 15.0) * 1_000.0) as u64);
}

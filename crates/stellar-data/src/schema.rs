//! Serde data file structs for game content definitions.
//!
//! These structs define the on-disk format for generators, planets, research
//! nodes, dust upgrades, events, and achievements. They are deserialized from
//! RON, JSON, or TOML data files and then resolved into registry definitions
//! by the loader.

use serde::Deserialize;

// ===========================================================================
// Generators
// ===========================================================================

/// A generator definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratorData {
    pub name: String,
    /// Falls back to `name` when empty.
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    pub base_cost: f64,
    pub cost_scaling: f64,
    pub base_revenue: f64,
    pub cycle_time: f64,
    pub manager_cost: f64,
}

// ===========================================================================
// Planets
// ===========================================================================

/// A planet definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct PlanetData {
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    pub unlock_cost: f64,
    pub multiplier: f64,
    pub effect: PlanetEffectData,
}

/// The special effect carried by a planet, with its magnitude.
#[derive(Debug, Clone, Copy, Deserialize)]
pub enum PlanetEffectData {
    CycleSpeed(f64),
    OfflineEfficiency(f64),
    CostReduction(f64),
    RevenueBoost(f64),
    /// Extra event duration in seconds.
    EventDuration(f64),
}

// ===========================================================================
// Research
// ===========================================================================

/// A research node definition in a data file. Prerequisites are named by
/// node name and may appear in any file order; the loader sorts them out.
#[derive(Debug, Clone, Deserialize)]
pub struct ResearchData {
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    pub cost: f64,
    #[serde(default)]
    pub requires: Vec<String>,
    pub effect: ResearchEffectData,
}

/// The permanent ability granted by a research node.
#[derive(Debug, Clone, Deserialize)]
pub enum ResearchEffectData {
    AutoRunAll,
    BulkBuy,
    OfflineEfficiency(f64),
    PlanetRefund(f64),
    RevenueMultiplier(f64),
    /// Names the first generator gated behind this node; it and every
    /// later generator require the node before they can be bought.
    GeneratorTierUnlock(String),
    PrestigeMultiplier(f64),
}

// ===========================================================================
// Dust upgrades
// ===========================================================================

/// A dust (prestige meta) upgrade definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct DustUpgradeData {
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    pub base_cost: f64,
    pub max_level: u32,
    pub effect: DustEffectData,
}

/// The per-level effect of a dust upgrade.
#[derive(Debug, Clone, Copy, Deserialize)]
pub enum DustEffectData {
    StartingEnergy(f64),
    CycleSpeed(f64),
    Revenue(f64),
    OfflineEfficiency(f64),
    CostReduction(f64),
}

// ===========================================================================
// Events
// ===========================================================================

/// A timed event definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    /// Base effect duration in seconds.
    pub duration: f64,
    pub effect: EventEffectData,
}

/// The temporary economic modifier applied by an active event.
#[derive(Debug, Clone, Copy, Deserialize)]
pub enum EventEffectData {
    Production(f64),
    Revenue(f64),
    CostReduction(f64),
}

// ===========================================================================
// Achievements
// ===========================================================================

/// An achievement definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct AchievementData {
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    pub predicate: PredicateData,
    pub bonus: BonusData,
}

/// A pure predicate over game state, mirroring the engine's closed union.
#[derive(Debug, Clone, Deserialize)]
pub enum PredicateData {
    Threshold {
        field: StateFieldData,
        at_least: f64,
    },
    AllOf(Vec<PredicateData>),
    AnyOf(Vec<PredicateData>),
}

/// A scalar view of the game state that predicates can threshold on.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateFieldData {
    LifetimeEnergy,
    ManualRuns,
    PlaytimeSeconds,
    MaxGeneratorOwned,
    MinGeneratorOwned,
    PlanetsUnlocked,
    TimesPrestiged,
}

/// The permanent bonus granted by an unlocked achievement.
#[derive(Debug, Clone, Copy, Deserialize)]
pub enum BonusData {
    Revenue(f64),
    Production(f64),
    GlobalMult(f64),
    CostReduction(f64),
    PrestigeDust(f64),
}

// ===========================================================================
// TOML wrappers (TOML does not support top-level arrays)
// ===========================================================================

/// Wrapper for a list of generators in TOML format.
#[derive(Debug, Clone, Deserialize)]
pub struct TomlGenerators {
    pub generators: Vec<GeneratorData>,
}

/// Wrapper for a list of planets in TOML format.
#[derive(Debug, Clone, Deserialize)]
pub struct TomlPlanets {
    pub planets: Vec<PlanetData>,
}

/// Wrapper for a list of research nodes in TOML format.
#[derive(Debug, Clone, Deserialize)]
pub struct TomlResearch {
    pub research: Vec<ResearchData>,
}

/// Wrapper for a list of dust upgrades in TOML format.
#[derive(Debug, Clone, Deserialize)]
pub struct TomlDustUpgrades {
    pub dust_upgrades: Vec<DustUpgradeData>,
}

/// Wrapper for a list of events in TOML format.
#[derive(Debug, Clone, Deserialize)]
pub struct TomlEvents {
    pub events: Vec<EventData>,
}

/// Wrapper for a list of achievements in TOML format.
#[derive(Debug, Clone, Deserialize)]
pub struct TomlAchievements {
    pub achievements: Vec<AchievementData>,
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // RON deserialization
    // -----------------------------------------------------------------------

    #[test]
    fn generator_data_from_ron() {
        let ron = r#"
            (
                name: "solar_panel",
                display_name: "Solar Panel",
                description: "Converts sunlight into energy.",
                base_cost: 4.0,
                cost_scaling: 1.07,
                base_revenue: 1.0,
                cycle_time: 0.6,
                manager_cost: 1000.0,
            )
        "#;
        let r#gen: GeneratorData = ron::from_str(ron).unwrap();
        assert_eq!(r#gen.name, "solar_panel");
        assert_eq!(r#gen.display_name, "Solar Panel");
        assert!((r#gen.base_cost - 4.0).abs() < f64::EPSILON);
        assert!((r#gen.cost_scaling - 1.07).abs() < f64::EPSILON);
        assert!((r#gen.cycle_time - 0.6).abs() < f64::EPSILON);
    }

    #[test]
    fn generator_data_defaults_from_ron() {
        let ron = r#"
            (
                name: "wind_turbine",
                base_cost: 60.0,
                cost_scaling: 1.15,
                base_revenue: 60.0,
                cycle_time: 3.0,
                manager_cost: 15000.0,
            )
        "#;
        let r#gen: GeneratorData = ron::from_str(ron).unwrap();
        assert_eq!(r#gen.name, "wind_turbine");
        assert!(r#gen.display_name.is_empty());
        assert!(r#gen.description.is_empty());
    }

    #[test]
    fn planet_data_from_ron() {
        let ron = r#"
            (
                name: "mars",
                display_name: "Mars",
                unlock_cost: 250.0,
                multiplier: 1.5,
                effect: CycleSpeed(0.10),
            )
        "#;
        let planet: PlanetData = ron::from_str(ron).unwrap();
        assert_eq!(planet.name, "mars");
        assert!((planet.multiplier - 1.5).abs() < f64::EPSILON);
        assert!(matches!(planet.effect, PlanetEffectData::CycleSpeed(v) if (v - 0.10).abs() < f64::EPSILON));
    }

    #[test]
    fn planet_effect_variants_from_ron() {
        for ron_val in [
            "CycleSpeed(0.1)",
            "OfflineEfficiency(0.5)",
            "CostReduction(0.1)",
            "RevenueBoost(0.3)",
            "EventDuration(15.0)",
        ] {
            let effect: PlanetEffectData = ron::from_str(ron_val).unwrap();
            match effect {
                PlanetEffectData::CycleSpeed(v)
                | PlanetEffectData::OfflineEfficiency(v)
                | PlanetEffectData::CostReduction(v)
                | PlanetEffectData::RevenueBoost(v)
                | PlanetEffectData::EventDuration(v) => assert!(v > 0.0),
            }
        }
    }

    #[test]
    fn research_data_from_ron() {
        let ron = r#"
            (
                name: "res_offline",
                display_name: "Deep Space Relays",
                cost: 2000.0,
                requires: ["res_auto_run"],
                effect: OfflineEfficiency(0.5),
            )
        "#;
        let research: ResearchData = ron::from_str(ron).unwrap();
        assert_eq!(research.name, "res_offline");
        assert_eq!(research.requires, vec!["res_auto_run"]);
        assert!(matches!(
            research.effect,
            ResearchEffectData::OfflineEfficiency(v) if (v - 0.5).abs() < f64::EPSILON
        ));
    }

    #[test]
    fn research_data_no_requires_from_ron() {
        let ron = r#"
            (
                name: "res_auto_run",
                cost: 500.0,
                effect: AutoRunAll,
            )
        "#;
        let research: ResearchData = ron::from_str(ron).unwrap();
        assert!(research.requires.is_empty());
        assert!(matches!(research.effect, ResearchEffectData::AutoRunAll));
    }

    #[test]
    fn research_tier_unlock_from_ron() {
        let ron = r#"
            (
                name: "res_tier2_unlock",
                cost: 10000.0,
                requires: ["res_offline"],
                effect: GeneratorTierUnlock("dark_energy_tap"),
            )
        "#;
        let research: ResearchData = ron::from_str(ron).unwrap();
        match &research.effect {
            ResearchEffectData::GeneratorTierUnlock(name) => {
                assert_eq!(name, "dark_energy_tap");
            }
            other => panic!("expected GeneratorTierUnlock, got: {other:?}"),
        }
    }

    #[test]
    fn dust_upgrade_data_from_ron() {
        let ron = r#"
            (
                name: "dust_starting",
                display_name: "Head Start",
                base_cost: 20.0,
                max_level: 20,
                effect: StartingEnergy(100.0),
            )
        "#;
        let upgrade: DustUpgradeData = ron::from_str(ron).unwrap();
        assert_eq!(upgrade.name, "dust_starting");
        assert_eq!(upgrade.max_level, 20);
        assert!(matches!(
            upgrade.effect,
            DustEffectData::StartingEnergy(v) if (v - 100.0).abs() < f64::EPSILON
        ));
    }

    #[test]
    fn event_data_from_ron() {
        let ron = r#"
            (
                name: "solar_flare",
                display_name: "Solar Flare",
                description: "Production doubled.",
                duration: 30.0,
                effect: Production(2.0),
            )
        "#;
        let event: EventData = ron::from_str(ron).unwrap();
        assert_eq!(event.name, "solar_flare");
        assert!((event.duration - 30.0).abs() < f64::EPSILON);
        assert!(matches!(event.effect, EventEffectData::Production(v) if (v - 2.0).abs() < f64::EPSILON));
    }

    #[test]
    fn achievement_data_from_ron() {
        let ron = r#"
            (
                name: "energy_1k",
                display_name: "Kilowatt Club",
                predicate: Threshold(field: lifetime_energy, at_least: 1000.0),
                bonus: Production(0.05),
            )
        "#;
        let ach: AchievementData = ron::from_str(ron).unwrap();
        assert_eq!(ach.name, "energy_1k");
        match &ach.predicate {
            PredicateData::Threshold { field, at_least } => {
                assert!(matches!(field, StateFieldData::LifetimeEnergy));
                assert!((at_least - 1000.0).abs() < f64::EPSILON);
            }
            other => panic!("expected Threshold, got: {other:?}"),
        }
        assert!(matches!(ach.bonus, BonusData::Production(v) if (v - 0.05).abs() < f64::EPSILON));
    }

    #[test]
    fn achievement_nested_predicate_from_ron() {
        let ron = r#"
            (
                name: "veteran",
                predicate: AllOf([
                    Threshold(field: times_prestiged, at_least: 1.0),
                    AnyOf([
                        Threshold(field: manual_runs, at_least: 100.0),
                        Threshold(field: playtime_seconds, at_least: 3600.0),
                    ]),
                ]),
                bonus: GlobalMult(0.05),
            )
        "#;
        let ach: AchievementData = ron::from_str(ron).unwrap();
        match &ach.predicate {
            PredicateData::AllOf(branches) => {
                assert_eq!(branches.len(), 2);
                assert!(matches!(branches[1], PredicateData::AnyOf(ref inner) if inner.len() == 2));
            }
            other => panic!("expected AllOf, got: {other:?}"),
        }
    }

    #[test]
    fn state_field_variants_from_ron() {
        for ron_val in [
            "lifetime_energy",
            "manual_runs",
            "playtime_seconds",
            "max_generator_owned",
            "min_generator_owned",
            "planets_unlocked",
            "times_prestiged",
        ] {
            let field: StateFieldData = ron::from_str(ron_val).unwrap();
            let _ = field;
        }
    }

    // -----------------------------------------------------------------------
    // JSON deserialization
    // -----------------------------------------------------------------------

    #[test]
    fn generator_data_from_json() {
        let json = r#"{
            "name": "solar_panel",
            "display_name": "Solar Panel",
            "base_cost": 4.0,
            "cost_scaling": 1.07,
            "base_revenue": 1.0,
            "cycle_time": 0.6,
            "manager_cost": 1000.0
        }"#;
        let r#gen: GeneratorData = serde_json::from_str(json).unwrap();
        assert_eq!(r#gen.name, "solar_panel");
        assert!(r#gen.description.is_empty());
    }

    #[test]
    fn planet_data_from_json() {
        let json = r#"{
            "name": "venus",
            "unlock_cost": 5000.0,
            "multiplier": 2.0,
            "effect": {"OfflineEfficiency": 0.5}
        }"#;
        let planet: PlanetData = serde_json::from_str(json).unwrap();
        assert_eq!(planet.name, "venus");
        assert!(matches!(
            planet.effect,
            PlanetEffectData::OfflineEfficiency(v) if (v - 0.5).abs() < f64::EPSILON
        ));
    }

    #[test]
    fn achievement_data_from_json() {
        let json = r#"{
            "name": "first_prestige",
            "predicate": {"Threshold": {"field": "times_prestiged", "at_least": 1.0}},
            "bonus": {"PrestigeDust": 0.1}
        }"#;
        let ach: AchievementData = serde_json::from_str(json).unwrap();
        assert_eq!(ach.name, "first_prestige");
        assert!(matches!(ach.bonus, BonusData::PrestigeDust(v) if (v - 0.1).abs() < f64::EPSILON));
    }

    // -----------------------------------------------------------------------
    // TOML deserialization (requires wrapper structs)
    // -----------------------------------------------------------------------

    #[test]
    fn generators_from_toml() {
        let toml_str = r#"
            [[generators]]
            name = "solar_panel"
            base_cost = 4.0
            cost_scaling = 1.07
            base_revenue = 1.0
            cycle_time = 0.6
            manager_cost = 1000.0

            [[generators]]
            name = "wind_turbine"
            base_cost = 60.0
            cost_scaling = 1.15
            base_revenue = 60.0
            cycle_time = 3.0
            manager_cost = 15000.0
        "#;
        let wrapper: TomlGenerators = toml::from_str(toml_str).unwrap();
        assert_eq!(wrapper.generators.len(), 2);
        assert_eq!(wrapper.generators[0].name, "solar_panel");
        assert_eq!(wrapper.generators[1].name, "wind_turbine");
    }

    #[test]
    fn research_from_toml() {
        // Unit variants are written as plain strings in TOML.
        let toml_str = r#"
            [[research]]
            name = "res_bulk_buy"
            cost = 750.0
            effect = "BulkBuy"
        "#;
        let wrapper: TomlResearch = toml::from_str(toml_str).unwrap();
        assert_eq!(wrapper.research.len(), 1);
        assert_eq!(wrapper.research[0].name, "res_bulk_buy");
        assert!(matches!(
            wrapper.research[0].effect,
            ResearchEffectData::BulkBuy
        ));
    }

    #[test]
    fn events_from_toml() {
        let toml_str = r#"
            [[events]]
            name = "wormhole"
            duration = 45.0

            [events.effect]
            CostReduction = 0.30
        "#;
        let wrapper: TomlEvents = toml::from_str(toml_str).unwrap();
        assert_eq!(wrapper.events.len(), 1);
        assert!(matches!(
            wrapper.events[0].effect,
            EventEffectData::CostReduction(v) if (v - 0.30).abs() < f64::EPSILON
        ));
    }
}

//! Resolution pipeline: reads data files, resolves cross-references, builds
//! the content registry.
//!
//! Provides format detection (RON/JSON/TOML), file discovery, and
//! deserialization helpers, plus [`load_content`] which assembles a
//! [`ContentRegistry`] from a content directory.

use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use stellar_core::achievement::{AchievementBonus, AchievementDef, Predicate, StateField};
use stellar_core::id::GeneratorId;
use stellar_core::registry::{
    ContentRegistry, ContentRegistryBuilder, DustEffect, DustUpgradeDef, EventDef, EventEffect,
    GeneratorDef, PlanetDef, PlanetEffect, RegistryError, ResearchDef, ResearchEffect,
};

use crate::schema::*;

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur during data loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// A required data file was not found in the given directory.
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: &'static str, dir: PathBuf },

    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A name reference could not be resolved.
    #[error("unresolved {expected_kind} reference '{name}' in {file}")]
    UnresolvedRef {
        file: PathBuf,
        name: String,
        expected_kind: &'static str,
    },

    /// A duplicate name was found.
    #[error("duplicate name '{name}' in {file}")]
    DuplicateName { file: PathBuf, name: String },

    /// The assembled content failed registry validation.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Scan a directory for a data file with the given base name (without extension).
///
/// Looks for `{base_name}.ron`, `{base_name}.toml`, and `{base_name}.json`.
/// Returns `Ok(None)` if no file is found, or `Err(ConflictingFormats)` if
/// multiple formats exist for the same base name.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let extensions = ["ron", "toml", "json"];
    let mut found: Option<PathBuf> = None;

    for ext in &extensions {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if candidate.exists() {
            if let Some(ref existing) = found {
                return Err(DataLoadError::ConflictingFormats {
                    a: existing.clone(),
                    b: candidate,
                });
            }
            found = Some(candidate);
        }
    }

    Ok(found)
}

/// Like [`find_data_file`], but returns an error if no file is found.
pub fn require_data_file(dir: &Path, base_name: &str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: Box::leak(base_name.to_string().into_boxed_str()),
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

/// Read a file and deserialize it according to its format (detected from extension).
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| DataLoadError::Parse {
            file: path.to_path_buf(),
            detail: e.to_string(),
        }),
        Format::Json => serde_json::from_str(&content).map_err(|e| DataLoadError::Parse {
            file: path.to_path_buf(),
            detail: e.to_string(),
        }),
        Format::Toml => toml::from_str(&content).map_err(|e| DataLoadError::Parse {
            file: path.to_path_buf(),
            detail: e.to_string(),
        }),
    }
}

/// Deserialize a list from a file. For TOML files, extracts the array at the
/// given `toml_key` from a top-level table. For RON and JSON, deserializes
/// directly as `Vec<T>`.
pub fn deserialize_list<T: DeserializeOwned>(
    path: &Path,
    toml_key: &str,
) -> Result<Vec<T>, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| DataLoadError::Parse {
            file: path.to_path_buf(),
            detail: e.to_string(),
        }),
        Format::Json => serde_json::from_str(&content).map_err(|e| DataLoadError::Parse {
            file: path.to_path_buf(),
            detail: e.to_string(),
        }),
        Format::Toml => {
            let table: toml::Value =
                toml::from_str(&content).map_err(|e| DataLoadError::Parse {
                    file: path.to_path_buf(),
                    detail: e.to_string(),
                })?;
            let array = table
                .get(toml_key)
                .ok_or_else(|| DataLoadError::Parse {
                    file: path.to_path_buf(),
                    detail: format!("missing key '{toml_key}' in TOML file"),
                })?
                .clone();
            array
                .try_into()
                .map_err(|e: toml::de::Error| DataLoadError::Parse {
                    file: path.to_path_buf(),
                    detail: e.to_string(),
                })
        }
    }
}

// ===========================================================================
// Name resolution helpers
// ===========================================================================

/// Look up a name in a map, returning an `UnresolvedRef` error if not found.
pub fn resolve_name<'a, V>(
    map: &'a HashMap<String, V>,
    name: &str,
    file: &Path,
    expected_kind: &'static str,
) -> Result<&'a V, DataLoadError> {
    map.get(name).ok_or_else(|| DataLoadError::UnresolvedRef {
        file: file.to_path_buf(),
        name: name.to_string(),
        expected_kind,
    })
}

/// Check whether a name already exists in a map, returning a `DuplicateName`
/// error if so.
pub fn check_duplicate<V>(
    map: &HashMap<String, V>,
    name: &str,
    file: &Path,
) -> Result<(), DataLoadError> {
    if map.contains_key(name) {
        Err(DataLoadError::DuplicateName {
            file: file.to_path_buf(),
            name: name.to_string(),
        })
    } else {
        Ok(())
    }
}

// ===========================================================================
// Registry assembly
// ===========================================================================

/// Load all content definition files from `dir` and assemble a registry.
///
/// `generators` is required; every other kind (`planets`, `research`,
/// `dust_upgrades`, `events`, `achievements`, `milestones`) is optional and
/// simply empty, or defaulted, when its file is absent. Each kind may be
/// provided as `.ron`, `.toml`, or `.json`, with at most one format per kind.
pub fn load_content(dir: &Path) -> Result<ContentRegistry, DataLoadError> {
    let mut builder = ContentRegistryBuilder::new();

    let generators_path = require_data_file(dir, "generators")?;
    let generator_ids = register_generators(&mut builder, &generators_path)?;

    if let Some(path) = find_data_file(dir, "planets")? {
        register_planets(&mut builder, &path)?;
    }
    if let Some(path) = find_data_file(dir, "research")? {
        register_research(&mut builder, &path, &generator_ids)?;
    }
    if let Some(path) = find_data_file(dir, "dust_upgrades")? {
        register_dust_upgrades(&mut builder, &path)?;
    }
    if let Some(path) = find_data_file(dir, "events")? {
        register_events(&mut builder, &path)?;
    }
    if let Some(path) = find_data_file(dir, "achievements")? {
        register_achievements(&mut builder, &path)?;
    }
    if let Some(path) = find_data_file(dir, "milestones")? {
        builder.set_milestones(deserialize_list(&path, "milestones")?);
    }

    Ok(builder.build()?)
}

/// Load the canonical content set shipped with this crate.
pub fn canonical_registry() -> Result<ContentRegistry, DataLoadError> {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("data");
    load_content(&dir)
}

fn register_generators(
    builder: &mut ContentRegistryBuilder,
    path: &Path,
) -> Result<HashMap<String, GeneratorId>, DataLoadError> {
    let list: Vec<GeneratorData> = deserialize_list(path, "generators")?;
    let mut ids = HashMap::new();

    for data in &list {
        check_duplicate(&ids, &data.name, path)?;
        let id = builder.register_generator(GeneratorDef {
            name: data.name.clone(),
            display_name: display_or_name(&data.display_name, &data.name),
            description: data.description.clone(),
            base_cost: data.base_cost,
            cost_scaling: data.cost_scaling,
            base_revenue: data.base_revenue,
            cycle_time: data.cycle_time,
            manager_cost: data.manager_cost,
        })?;
        ids.insert(data.name.clone(), id);
    }

    Ok(ids)
}

fn register_planets(
    builder: &mut ContentRegistryBuilder,
    path: &Path,
) -> Result<(), DataLoadError> {
    let list: Vec<PlanetData> = deserialize_list(path, "planets")?;
    let mut seen: HashMap<String, ()> = HashMap::new();

    for data in &list {
        check_duplicate(&seen, &data.name, path)?;
        seen.insert(data.name.clone(), ());
        builder.register_planet(PlanetDef {
            name: data.name.clone(),
            display_name: display_or_name(&data.display_name, &data.name),
            description: data.description.clone(),
            unlock_cost: data.unlock_cost,
            multiplier: data.multiplier,
            effect: planet_effect(data.effect),
        })?;
    }

    Ok(())
}

fn register_research(
    builder: &mut ContentRegistryBuilder,
    path: &Path,
    generator_ids: &HashMap<String, GeneratorId>,
) -> Result<(), DataLoadError> {
    let list: Vec<ResearchData> = deserialize_list(path, "research")?;

    let mut seen: HashMap<String, ()> = HashMap::new();
    for data in &list {
        check_duplicate(&seen, &data.name, path)?;
        seen.insert(data.name.clone(), ());
    }

    // Nodes may reference later entries in the file. Register in passes,
    // deferring nodes whose prerequisites are not in the builder yet; a
    // pass without progress means an unknown prerequisite or a cycle.
    let mut remaining = list;
    while !remaining.is_empty() {
        let mut deferred = Vec::new();
        let mut progressed = false;

        for data in remaining {
            let requires: Option<Vec<_>> = data
                .requires
                .iter()
                .map(|name| builder.research_id(name))
                .collect();
            match requires {
                Some(requires) => {
                    let effect = research_effect(&data.effect, generator_ids, path)?;
                    builder.register_research(ResearchDef {
                        name: data.name.clone(),
                        display_name: display_or_name(&data.display_name, &data.name),
                        description: data.description.clone(),
                        cost: data.cost,
                        requires,
                        effect,
                    })?;
                    progressed = true;
                }
                None => deferred.push(data),
            }
        }

        if !progressed {
            let Some(first) = deferred.first() else { break };
            let missing = first
                .requires
                .iter()
                .find(|name| builder.research_id(name).is_none())
                .cloned()
                .unwrap_or_else(|| first.name.clone());
            return Err(DataLoadError::UnresolvedRef {
                file: path.to_path_buf(),
                name: missing,
                expected_kind: "research",
            });
        }
        remaining = deferred;
    }

    Ok(())
}

fn register_dust_upgrades(
    builder: &mut ContentRegistryBuilder,
    path: &Path,
) -> Result<(), DataLoadError> {
    let list: Vec<DustUpgradeData> = deserialize_list(path, "dust_upgrades")?;
    let mut seen: HashMap<String, ()> = HashMap::new();

    for data in &list {
        check_duplicate(&seen, &data.name, path)?;
        seen.insert(data.name.clone(), ());
        builder.register_dust_upgrade(DustUpgradeDef {
            name: data.name.clone(),
            display_name: display_or_name(&data.display_name, &data.name),
            description: data.description.clone(),
            base_cost: data.base_cost,
            max_level: data.max_level,
            effect: dust_effect(data.effect),
        })?;
    }

    Ok(())
}

fn register_events(
    builder: &mut ContentRegistryBuilder,
    path: &Path,
) -> Result<(), DataLoadError> {
    let list: Vec<EventData> = deserialize_list(path, "events")?;
    let mut seen: HashMap<String, ()> = HashMap::new();

    for data in &list {
        check_duplicate(&seen, &data.name, path)?;
        seen.insert(data.name.clone(), ());
        builder.register_event(EventDef {
            name: data.name.clone(),
            display_name: display_or_name(&data.display_name, &data.name),
            description: data.description.clone(),
            duration: data.duration,
            effect: event_effect(data.effect),
        })?;
    }

    Ok(())
}

fn register_achievements(
    builder: &mut ContentRegistryBuilder,
    path: &Path,
) -> Result<(), DataLoadError> {
    let list: Vec<AchievementData> = deserialize_list(path, "achievements")?;
    let mut seen: HashMap<String, ()> = HashMap::new();

    for data in &list {
        check_duplicate(&seen, &data.name, path)?;
        seen.insert(data.name.clone(), ());
        builder.register_achievement(AchievementDef {
            name: data.name.clone(),
            display_name: display_or_name(&data.display_name, &data.name),
            description: data.description.clone(),
            predicate: predicate(&data.predicate),
            bonus: achievement_bonus(data.bonus),
        })?;
    }

    Ok(())
}

// ===========================================================================
// Schema-to-definition conversion
// ===========================================================================

fn display_or_name(display: &str, name: &str) -> String {
    if display.is_empty() {
        name.to_string()
    } else {
        display.to_string()
    }
}

fn planet_effect(data: PlanetEffectData) -> PlanetEffect {
    match data {
        PlanetEffectData::CycleSpeed(v) => PlanetEffect::CycleSpeed(v),
        PlanetEffectData::OfflineEfficiency(v) => PlanetEffect::OfflineEfficiency(v),
        PlanetEffectData::CostReduction(v) => PlanetEffect::CostReduction(v),
        PlanetEffectData::RevenueBoost(v) => PlanetEffect::RevenueBoost(v),
        PlanetEffectData::EventDuration(v) => PlanetEffect::EventDuration(v),
    }
}

fn research_effect(
    data: &ResearchEffectData,
    generator_ids: &HashMap<String, GeneratorId>,
    path: &Path,
) -> Result<ResearchEffect, DataLoadError> {
    Ok(match data {
        ResearchEffectData::AutoRunAll => ResearchEffect::AutoRunAll,
        ResearchEffectData::BulkBuy => ResearchEffect::BulkBuy,
        ResearchEffectData::OfflineEfficiency(v) => ResearchEffect::OfflineEfficiency(*v),
        ResearchEffectData::PlanetRefund(v) => ResearchEffect::PlanetRefund(*v),
        ResearchEffectData::RevenueMultiplier(v) => ResearchEffect::RevenueMultiplier(*v),
        ResearchEffectData::GeneratorTierUnlock(name) => {
            let id = resolve_name(generator_ids, name, path, "generator")?;
            ResearchEffect::GeneratorTierUnlock(id.0)
        }
        ResearchEffectData::PrestigeMultiplier(v) => ResearchEffect::PrestigeMultiplier(*v),
    })
}

fn dust_effect(data: DustEffectData) -> DustEffect {
    match data {
        DustEffectData::StartingEnergy(v) => DustEffect::StartingEnergy(v),
        DustEffectData::CycleSpeed(v) => DustEffect::CycleSpeed(v),
        DustEffectData::Revenue(v) => DustEffect::Revenue(v),
        DustEffectData::OfflineEfficiency(v) => DustEffect::OfflineEfficiency(v),
        DustEffectData::CostReduction(v) => DustEffect::CostReduction(v),
    }
}

fn event_effect(data: EventEffectData) -> EventEffect {
    match data {
        EventEffectData::Production(v) => EventEffect::Production(v),
        EventEffectData::Revenue(v) => EventEffect::Revenue(v),
        EventEffectData::CostReduction(v) => EventEffect::CostReduction(v),
    }
}

fn predicate(data: &PredicateData) -> Predicate {
    match data {
        PredicateData::Threshold { field, at_least } => Predicate::Threshold {
            field: state_field(*field),
            at_least: *at_least,
        },
        PredicateData::AllOf(branches) => {
            Predicate::AllOf(branches.iter().map(predicate).collect())
        }
        PredicateData::AnyOf(branches) => {
            Predicate::AnyOf(branches.iter().map(predicate).collect())
        }
    }
}

fn state_field(data: StateFieldData) -> StateField {
    match data {
        StateFieldData::LifetimeEnergy => StateField::LifetimeEnergy,
        StateFieldData::ManualRuns => StateField::ManualRuns,
        StateFieldData::PlaytimeSeconds => StateField::PlaytimeSeconds,
        StateFieldData::MaxGeneratorOwned => StateField::MaxGeneratorOwned,
        StateFieldData::MinGeneratorOwned => StateField::MinGeneratorOwned,
        StateFieldData::PlanetsUnlocked => StateField::PlanetsUnlocked,
        StateFieldData::TimesPrestiged => StateField::TimesPrestiged,
    }
}

fn achievement_bonus(data: BonusData) -> AchievementBonus {
    match data {
        BonusData::Revenue(v) => AchievementBonus::Revenue(v),
        BonusData::Production(v) => AchievementBonus::Production(v),
        BonusData::GlobalMult(v) => AchievementBonus::GlobalMult(v),
        BonusData::CostReduction(v) => AchievementBonus::CostReduction(v),
        BonusData::PrestigeDust(v) => AchievementBonus::PrestigeDust(v),
    }
}

// ===========================================================================
// Tests
// ===========================================================================

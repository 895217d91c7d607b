use crate::achievement::AchievementDef;
use crate::id::*;
use std::collections::HashMap;

/// Default milestone thresholds shared by every generator. Each reached
/// threshold doubles the generator's output multiplier.
pub const DEFAULT_MILESTONES: [u32; 6] = [25, 50, 100, 200, 300, 400];

/// A generator type definition. Generators convert time into energy through
/// discrete production cycles.
#[derive(Debug, Clone)]
pub struct GeneratorDef {
    /// Stable snake_case key, used in data files and saves.
    pub name: String,
    pub display_name: String,
    pub description: String,
    /// Cost of the first unit.
    pub base_cost: f64,
    /// Geometric growth factor per owned unit. Must be >= 1.
    pub cost_scaling: f64,
    /// Energy produced by one completed cycle of one unit, before bonuses.
    pub base_revenue: f64,
    /// Duration of one production cycle, in seconds.
    pub cycle_time: f64,
    /// One-time cost to automate cycle restarts.
    pub manager_cost: f64,
}

/// The single special effect carried by a planet, with its magnitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlanetEffect {
    /// Additive cycle-time reduction fraction.
    CycleSpeed(f64),
    /// Additive offline-efficiency bonus.
    OfflineEfficiency(f64),
    /// Additive generator cost reduction fraction.
    CostReduction(f64),
    /// Additive revenue bonus fraction.
    RevenueBoost(f64),
    /// Extra duration for activated events, in seconds.
    EventDuration(f64),
}

/// A planet definition. Unlocking is one-time (until prestige) and grants a
/// persistent global multiplier plus one special effect.
#[derive(Debug, Clone)]
pub struct PlanetDef {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub unlock_cost: f64,
    /// Multiplies all production while unlocked. Must be > 1.
    pub multiplier: f64,
    pub effect: PlanetEffect,
}

/// The permanent ability granted by a research node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResearchEffect {
    /// A manual run starts every stopped, owned, managerless generator.
    AutoRunAll,
    /// Enables buy batch sizes larger than one.
    BulkBuy,
    /// Additive offline-efficiency bonus.
    OfflineEfficiency(f64),
    /// Fraction of a planet's unlock cost refunded on unlock.
    PlanetRefund(f64),
    /// Multiplier on all generator revenue (online only).
    RevenueMultiplier(f64),
    /// Generators at this registry index and above require this node.
    GeneratorTierUnlock(u32),
    /// Multiplier on computed dust gain at prestige.
    PrestigeMultiplier(f64),
}

/// A research node definition. Prerequisites are AND-combined.
#[derive(Debug, Clone)]
pub struct ResearchDef {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub cost: f64,
    pub requires: Vec<ResearchId>,
    pub effect: ResearchEffect,
}

/// The per-level effect of a dust (prestige meta) upgrade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DustEffect {
    /// Starting energy granted after a prestige reset, per level.
    StartingEnergy(f64),
    /// Additive cycle-time reduction fraction, per level.
    CycleSpeed(f64),
    /// Additive revenue bonus fraction, per level.
    Revenue(f64),
    /// Additive offline-efficiency bonus, per level.
    OfflineEfficiency(f64),
    /// Additive generator cost reduction fraction, per level.
    CostReduction(f64),
}

/// A dust upgrade definition. Cost grows linearly with level:
/// `base_cost * (level + 1)`, unlike the geometric generator curve.
#[derive(Debug, Clone)]
pub struct DustUpgradeDef {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub base_cost: f64,
    pub max_level: u32,
    pub effect: DustEffect,
}

/// The temporary economic modifier applied by an active event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventEffect {
    /// Multiplier on generator revenue while active.
    Production(f64),
    /// Multiplier on generator revenue while active (revenue flavor).
    Revenue(f64),
    /// Additive cost reduction fraction while active.
    CostReduction(f64),
}

/// A timed event definition.
#[derive(Debug, Clone)]
pub struct EventDef {
    pub name: String,
    pub display_name: String,
    pub description: String,
    /// Base effect duration in seconds, before planet bonuses.
    pub duration: f64,
    pub effect: EventEffect,
}

/// Errors raised while building a content registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("duplicate {kind} name '{name}'")]
    DuplicateName { kind: &'static str, name: String },

    #[error("invalid {kind} definition '{name}': {detail}")]
    InvalidDefinition {
        kind: &'static str,
        name: String,
        detail: String,
    },

    #[error("research '{name}' references unregistered prerequisite {prereq:?}")]
    InvalidPrerequisite { name: String, prereq: ResearchId },

    #[error("milestone thresholds must be non-empty and strictly ascending")]
    InvalidMilestones,
}

/// Builder for constructing an immutable [`ContentRegistry`].
///
/// Definitions are registered in dependency order (research prerequisites
/// must already be registered) and validated as they arrive; `build()`
/// freezes the result.
#[derive(Debug)]
pub struct ContentRegistryBuilder {
    generators: Vec<GeneratorDef>,
    generator_names: HashMap<String, GeneratorId>,
    planets: Vec<PlanetDef>,
    planet_names: HashMap<String, PlanetId>,
    research: Vec<ResearchDef>,
    research_names: HashMap<String, ResearchId>,
    dust_upgrades: Vec<DustUpgradeDef>,
    dust_names: HashMap<String, DustUpgradeId>,
    events: Vec<EventDef>,
    event_names: HashMap<String, EventTypeId>,
    achievements: Vec<AchievementDef>,
    achievement_names: HashMap<String, AchievementId>,
    milestones: Vec<u32>,
}

impl Default for ContentRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentRegistryBuilder {
    pub fn new() -> Self {
        Self {
            generators: Vec::new(),
            generator_names: HashMap::new(),
            planets: Vec::new(),
            planet_names: HashMap::new(),
            research: Vec::new(),
            research_names: HashMap::new(),
            dust_upgrades: Vec::new(),
            dust_names: HashMap::new(),
            events: Vec::new(),
            event_names: HashMap::new(),
            achievements: Vec::new(),
            achievement_names: HashMap::new(),
            milestones: DEFAULT_MILESTONES.to_vec(),
        }
    }

    /// Register a generator. Returns its ID, assigned in registration order.
    pub fn register_generator(&mut self, def: GeneratorDef) -> Result<GeneratorId, RegistryError> {
        check_name("generator", &self.generator_names, &def.name)?;
        validate_generator(&def)?;
        let id = GeneratorId(self.generators.len() as u32);
        self.generator_names.insert(def.name.clone(), id);
        self.generators.push(def);
        Ok(id)
    }

    /// Register a planet. Returns its ID.
    pub fn register_planet(&mut self, def: PlanetDef) -> Result<PlanetId, RegistryError> {
        check_name("planet", &self.planet_names, &def.name)?;
        validate_planet(&def)?;
        let id = PlanetId(self.planets.len() as u32);
        self.planet_names.insert(def.name.clone(), id);
        self.planets.push(def);
        Ok(id)
    }

    /// Register a research node. Every prerequisite must already be
    /// registered, which forces topological registration order and rules
    /// out cycles and self-references.
    pub fn register_research(&mut self, def: ResearchDef) -> Result<ResearchId, RegistryError> {
        check_name("research", &self.research_names, &def.name)?;
        if !(def.cost.is_finite() && def.cost >= 0.0) {
            return Err(invalid("research", &def.name, "cost must be finite and >= 0"));
        }
        for &prereq in &def.requires {
            if prereq.0 as usize >= self.research.len() {
                return Err(RegistryError::InvalidPrerequisite {
                    name: def.name.clone(),
                    prereq,
                });
            }
        }
        let id = ResearchId(self.research.len() as u32);
        self.research_names.insert(def.name.clone(), id);
        self.research.push(def);
        Ok(id)
    }

    /// Register a dust upgrade. Returns its ID.
    pub fn register_dust_upgrade(
        &mut self,
        def: DustUpgradeDef,
    ) -> Result<DustUpgradeId, RegistryError> {
        check_name("dust upgrade", &self.dust_names, &def.name)?;
        if !(def.base_cost.is_finite() && def.base_cost > 0.0) {
            return Err(invalid(
                "dust upgrade",
                &def.name,
                "base_cost must be finite and > 0",
            ));
        }
        if def.max_level == 0 {
            return Err(invalid("dust upgrade", &def.name, "max_level must be >= 1"));
        }
        let id = DustUpgradeId(self.dust_upgrades.len() as u32);
        self.dust_names.insert(def.name.clone(), id);
        self.dust_upgrades.push(def);
        Ok(id)
    }

    /// Register a timed event. Returns its ID.
    pub fn register_event(&mut self, def: EventDef) -> Result<EventTypeId, RegistryError> {
        check_name("event", &self.event_names, &def.name)?;
        validate_event(&def)?;
        let id = EventTypeId(self.events.len() as u32);
        self.event_names.insert(def.name.clone(), id);
        self.events.push(def);
        Ok(id)
    }

    /// Register an achievement. Returns its ID.
    pub fn register_achievement(
        &mut self,
        def: AchievementDef,
    ) -> Result<AchievementId, RegistryError> {
        check_name("achievement", &self.achievement_names, &def.name)?;
        let id = AchievementId(self.achievements.len() as u32);
        self.achievement_names.insert(def.name.clone(), id);
        self.achievements.push(def);
        Ok(id)
    }

    /// Replace the shared milestone thresholds.
    pub fn set_milestones(&mut self, thresholds: Vec<u32>) {
        self.milestones = thresholds;
    }

    /// Lookup a research ID by name. Available mid-registration so that
    /// dependents can reference earlier nodes.
    pub fn research_id(&self, name: &str) -> Option<ResearchId> {
        self.research_names.get(name).copied()
    }

    /// Finalize and build the immutable registry.
    pub fn build(self) -> Result<ContentRegistry, RegistryError> {
        if self.milestones.is_empty() || self.milestones.windows(2).any(|w| w[0] >= w[1]) {
            return Err(RegistryError::InvalidMilestones);
        }

        Ok(ContentRegistry {
            generators: self.generators,
            generator_names: self.generator_names,
            planets: self.planets,
            planet_names: self.planet_names,
            research: self.research,
            research_names: self.research_names,
            dust_upgrades: self.dust_upgrades,
            dust_names: self.dust_names,
            events: self.events,
            event_names: self.event_names,
            achievements: self.achievements,
            achievement_names: self.achievement_names,
            milestones: self.milestones,
        })
    }
}

fn check_name<T>(
    kind: &'static str,
    names: &HashMap<String, T>,
    name: &str,
) -> Result<(), RegistryError> {
    if names.contains_key(name) {
        return Err(RegistryError::DuplicateName {
            kind,
            name: name.to_string(),
        });
    }
    Ok(())
}

fn invalid(kind: &'static str, name: &str, detail: &str) -> RegistryError {
    RegistryError::InvalidDefinition {
        kind,
        name: name.to_string(),
        detail: detail.to_string(),
    }
}

fn validate_generator(def: &GeneratorDef) -> Result<(), RegistryError> {
    if !(def.base_cost.is_finite() && def.base_cost > 0.0) {
        return Err(invalid("generator", &def.name, "base_cost must be finite and > 0"));
    }
    if !(def.cost_scaling.is_finite() && def.cost_scaling >= 1.0) {
        return Err(invalid("generator", &def.name, "cost_scaling must be >= 1"));
    }
    if !(def.base_revenue.is_finite() && def.base_revenue >= 0.0) {
        return Err(invalid("generator", &def.name, "base_revenue must be finite and >= 0"));
    }
    if !(def.cycle_time.is_finite() && def.cycle_time > 0.0) {
        return Err(invalid("generator", &def.name, "cycle_time must be finite and > 0"));
    }
    if !(def.manager_cost.is_finite() && def.manager_cost >= 0.0) {
        return Err(invalid("generator", &def.name, "manager_cost must be finite and >= 0"));
    }
    Ok(())
}

fn validate_planet(def: &PlanetDef) -> Result<(), RegistryError> {
    if !(def.unlock_cost.is_finite() && def.unlock_cost > 0.0) {
        return Err(invalid("planet", &def.name, "unlock_cost must be finite and > 0"));
    }
    if !(def.multiplier.is_finite() && def.multiplier > 1.0) {
        return Err(invalid("planet", &def.name, "multiplier must be > 1"));
    }
    Ok(())
}

fn validate_event(def: &EventDef) -> Result<(), RegistryError> {
    if !(def.duration.is_finite() && def.duration > 0.0) {
        return Err(invalid("event", &def.name, "duration must be finite and > 0"));
    }
    let value = match def.effect {
        EventEffect::Production(v) | EventEffect::Revenue(v) | EventEffect::CostReduction(v) => v,
    };
    if !(value.is_finite() && value > 0.0) {
        return Err(invalid("event", &def.name, "effect value must be finite and > 0"));
    }
    if matches!(def.effect, EventEffect::CostReduction(v) if v >= 1.0) {
        return Err(invalid("event", &def.name, "cost reduction must be < 1"));
    }
    Ok(())
}

/// Immutable content registry. Frozen after build(). Thread-safe to share.
#[derive(Debug)]
pub struct ContentRegistry {
    generators: Vec<GeneratorDef>,
    generator_names: HashMap<String, GeneratorId>,
    planets: Vec<PlanetDef>,
    planet_names: HashMap<String, PlanetId>,
    research: Vec<ResearchDef>,
    research_names: HashMap<String, ResearchId>,
    dust_upgrades: Vec<DustUpgradeDef>,
    dust_names: HashMap<String, DustUpgradeId>,
    events: Vec<EventDef>,
    event_names: HashMap<String, EventTypeId>,
    achievements: Vec<AchievementDef>,
    achievement_names: HashMap<String, AchievementId>,
    milestones: Vec<u32>,
}

impl ContentRegistry {
    pub fn generators(&self) -> &[GeneratorDef] {
        &self.generators
    }

    /// Definition by ID. IDs come from this registry, so the index is valid
    /// by construction.
    pub fn generator(&self, id: GeneratorId) -> &GeneratorDef {
        &self.generators[id.0 as usize]
    }

    pub fn generator_id(&self, name: &str) -> Option<GeneratorId> {
        self.generator_names.get(name).copied()
    }

    pub fn generator_count(&self) -> usize {
        self.generators.len()
    }

    pub fn planets(&self) -> &[PlanetDef] {
        &self.planets
    }

    pub fn planet(&self, id: PlanetId) -> &PlanetDef {
        &self.planets[id.0 as usize]
    }

    pub fn planet_id(&self, name: &str) -> Option<PlanetId> {
        self.planet_names.get(name).copied()
    }

    pub fn planet_count(&self) -> usize {
        self.planets.len()
    }

    pub fn research_nodes(&self) -> &[ResearchDef] {
        &self.research
    }

    pub fn research(&self, id: ResearchId) -> &ResearchDef {
        &self.research[id.0 as usize]
    }

    pub fn research_id(&self, name: &str) -> Option<ResearchId> {
        self.research_names.get(name).copied()
    }

    pub fn research_count(&self) -> usize {
        self.research.len()
    }

    pub fn dust_upgrades(&self) -> &[DustUpgradeDef] {
        &self.dust_upgrades
    }

    pub fn dust_upgrade(&self, id: DustUpgradeId) -> &DustUpgradeDef {
        &self.dust_upgrades[id.0 as usize]
    }

    pub fn dust_upgrade_id(&self, name: &str) -> Option<DustUpgradeId> {
        self.dust_names.get(name).copied()
    }

    pub fn dust_upgrade_count(&self) -> usize {
        self.dust_upgrades.len()
    }

    pub fn events(&self) -> &[EventDef] {
        &self.events
    }

    pub fn event(&self, id: EventTypeId) -> &EventDef {
        &self.events[id.0 as usize]
    }

    pub fn event_id(&self, name: &str) -> Option<EventTypeId> {
        self.event_names.get(name).copied()
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    pub fn achievements(&self) -> &[AchievementDef] {
        &self.achievements
    }

    pub fn achievement(&self, id: AchievementId) -> &AchievementDef {
        &self.achievements[id.0 as usize]
    }

    pub fn achievement_id(&self, name: &str) -> Option<AchievementId> {
        self.achievement_names.get(name).copied()
    }

    pub fn achievement_count(&self) -> usize {
        self.achievements.len()
    }

    /// Shared milestone thresholds, strictly ascending.
    pub fn milestones(&self) -> &[u32] {
        &self.milestones
    }
}

//! Research gating and effect lookups.
//!
//! Research nodes are one-way unlocks with AND-combined prerequisites. The
//! unlocked set only grows; it survives prestige resets. All functions here
//! are pure reads over the unlocked set and the registry, so they serve both
//! real purchases and eligibility queries.

use crate::id::ResearchId;
use crate::registry::{ContentRegistry, ResearchEffect};
use std::collections::BTreeSet;

/// Whether every prerequisite of `id` is unlocked.
pub fn prerequisites_met(
    unlocked: &BTreeSet<ResearchId>,
    registry: &ContentRegistry,
    id: ResearchId,
) -> bool {
    registry
        .research(id)
        .requires
        .iter()
        .all(|req| unlocked.contains(req))
}

/// Whether `id` could be purchased with the given balance: not yet unlocked,
/// prerequisites met, and affordable.
pub fn can_research(
    unlocked: &BTreeSet<ResearchId>,
    registry: &ContentRegistry,
    id: ResearchId,
    energy: f64,
) -> bool {
    !unlocked.contains(&id)
        && prerequisites_met(unlocked, registry, id)
        && energy >= registry.research(id).cost
}

/// Whether any unlocked node carries an effect matching `pred`.
pub fn has_effect(
    unlocked: &BTreeSet<ResearchId>,
    registry: &ContentRegistry,
    pred: impl Fn(&ResearchEffect) -> bool,
) -> bool {
    unlocked.iter().any(|id| pred(&registry.research(*id).effect))
}

/// Whether the generator at `index` is still locked behind a tier-unlock
/// node that has not been researched.
pub fn generator_gated(
    unlocked: &BTreeSet<ResearchId>,
    registry: &ContentRegistry,
    index: u32,
) -> bool {
    registry.research_nodes().iter().enumerate().any(|(i, def)| {
        matches!(def.effect, ResearchEffect::GeneratorTierUnlock(tier) if index >= tier)
            && !unlocked.contains(&ResearchId(i as u32))
    })
}

/// Product of all unlocked revenue multipliers. 1.0 with none unlocked.
pub fn revenue_multiplier(unlocked: &BTreeSet<ResearchId>, registry: &ContentRegistry) -> f64 {
    unlocked
        .iter()
        .filter_map(|id| match registry.research(*id).effect {
            ResearchEffect::RevenueMultiplier(v) => Some(v),
            _ => None,
        })
        .product()
}

/// Sum of all unlocked offline-efficiency bonuses.
pub fn offline_bonus(unlocked: &BTreeSet<ResearchId>, registry: &ContentRegistry) -> f64 {
    unlocked
        .iter()
        .filter_map(|id| match registry.research(*id).effect {
            ResearchEffect::OfflineEfficiency(v) => Some(v),
            _ => None,
        })
        .sum()
}

/// Sum of all unlocked planet-refund fractions.
pub fn planet_refund(unlocked: &BTreeSet<ResearchId>, registry: &ContentRegistry) -> f64 {
    unlocked
        .iter()
        .filter_map(|id| match registry.research(*id).effect {
            ResearchEffect::PlanetRefund(v) => Some(v),
            _ => None,
        })
        .sum()
}

/// Product of all unlocked prestige (dust gain) multipliers. 1.0 with none.
pub fn prestige_multiplier(unlocked: &BTreeSet<ResearchId>, registry: &ContentRegistry) -> f64 {
    unlocked
        .iter()
        .filter_map(|id| match registry.research(*id).effect {
            ResearchEffect::PrestigeMultiplier(v) => Some(v),
            _ => None,
        })
        .product()
}

/// Whether a manual run should start every eligible generator.
pub fn auto_run_all(unlocked: &BTreeSet<ResearchId>, registry: &ContentRegistry) -> bool {
    has_effect(unlocked, registry, |e| matches!(e, ResearchEffect::AutoRunAll))
}

/// Whether batch sizes above one are available.
pub fn bulk_buy_enabled(unlocked: &BTreeSet<ResearchId>, registry: &ContentRegistry) -> bool {
    has_effect(unlocked, registry, |e| matches!(e, ResearchEffect::BulkBuy))
}

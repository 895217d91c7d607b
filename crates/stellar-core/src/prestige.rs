//! Stellar reset math: dust gain, dust upgrade pricing, starting energy.
//!
//! Dust gain is a pure function of lifetime energy plus the aggregated
//! prestige bonuses. The engine owns the reset itself; this module only
//! answers "how much" questions so previews and the actual reset always
//! agree.

use crate::registry::{ContentRegistry, DustEffect, DustUpgradeDef};
use crate::state::PrestigeState;

/// Lifetime energy below which a reset grants no dust.
pub const PRESTIGE_FLOOR: f64 = 1_000_000.0;

/// Scale constant in the square-root dust formula.
const DUST_GAIN_SCALE: f64 = 150.0;

/// Dust granted for a reset at `lifetime_energy`.
///
/// Square root of lifetime energy in floor units, scaled and floored, then
/// boosted by achievement dust bonuses and the research prestige
/// multiplier, flooring after each boost so displayed previews are exact.
pub fn dust_gain(lifetime_energy: f64, prestige_dust_bonus: f64, research_multiplier: f64) -> f64 {
    if lifetime_energy < PRESTIGE_FLOOR || !lifetime_energy.is_finite() {
        return 0.0;
    }
    let mut dust = (DUST_GAIN_SCALE * (lifetime_energy / PRESTIGE_FLOOR).sqrt() - 0.5).floor();
    if prestige_dust_bonus > 0.0 {
        dust = (dust * (1.0 + prestige_dust_bonus)).floor();
    }
    if research_multiplier > 1.0 {
        dust = (dust * research_multiplier).floor();
    }
    dust.max(0.0)
}

/// Cost of the next level of a dust upgrade, `None` once maxed.
pub fn dust_upgrade_cost(def: &DustUpgradeDef, level: u32) -> Option<f64> {
    if level >= def.max_level {
        return None;
    }
    Some(def.base_cost * f64::from(level + 1))
}

/// Energy a fresh run starts with, from banked starting-energy levels.
pub fn starting_energy(prestige: &PrestigeState, registry: &ContentRegistry) -> f64 {
    registry
        .dust_upgrades()
        .iter()
        .enumerate()
        .map(|(i, def)| {
            let level = prestige.level(crate::id::DustUpgradeId(i as u32));
            match def.effect {
                DustEffect::StartingEnergy(per_level) => per_level * f64::from(level),
                _ => 0.0,
            }
        })
        .sum()
}

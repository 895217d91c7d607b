//! Offline catch-up.
//!
//! On load, elapsed wall time since the last checkpoint is converted into a
//! single energy grant. Only managed generators with at least one unit earn
//! while away, and cycles are credited fractionally rather than simulated,
//! so the grant costs one pass over the generator list no matter how long
//! the absence was.

use crate::bonus::Bonuses;
use crate::economy;
use crate::registry::ContentRegistry;
use crate::state::GameState;

/// Cap on credited absence, in seconds.
pub const MAX_OFFLINE_SECONDS: f64 = 86_400.0;

/// Result of offline catch-up, for the engine to apply and announce.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OfflineGrant {
    pub energy: f64,
    pub seconds: u64,
}

impl OfflineGrant {
    pub fn none() -> Self {
        OfflineGrant {
            energy: 0.0,
            seconds: 0,
        }
    }

    pub fn is_none(&self) -> bool {
        self.energy <= 0.0
    }
}

/// Earnings for the absence between `state.last_checkpoint_ms` and `now_ms`.
///
/// Absences under one second grant nothing, matching the tick the player
/// would barely have missed. A checkpoint in the future grants nothing.
pub fn offline_progress(state: &GameState, registry: &ContentRegistry, now_ms: u64) -> OfflineGrant {
    let elapsed_ms = now_ms.saturating_sub(state.last_checkpoint_ms);
    let elapsed = (elapsed_ms as f64 / 1_000.0).min(MAX_OFFLINE_SECONDS);
    if elapsed < 1.0 {
        return OfflineGrant::none();
    }

    let bonuses = Bonuses::offline(state, registry);
    let thresholds = registry.milestones();
    let mut total = 0.0;
    for (def, gs) in registry.generators().iter().zip(&state.generators) {
        if !gs.has_manager || gs.owned == 0 {
            continue;
        }
        let cycle = economy::effective_cycle_time(def, &bonuses);
        if cycle <= 0.0 {
            continue;
        }
        let cycles = elapsed / cycle;
        total += cycles * economy::generator_revenue(def, gs.owned, thresholds, &bonuses);
    }

    if total <= 0.0 {
        return OfflineGrant::none();
    }
    OfflineGrant {
        energy: total * bonuses.offline_efficiency,
        seconds: elapsed as u64,
    }
}

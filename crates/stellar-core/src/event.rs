//! Timed random event lifecycle.
//!
//! Events move through two phases. A spawned event is first *pending*: offered
//! to the player for a fixed acceptance window, after which it silently
//! expires. An accepted event becomes *active* and applies its economic
//! modifier until its duration elapses. At most one pending and one active
//! event exist at a time, and a new offer spawns only when neither does.

use crate::id::EventTypeId;
use crate::rng::SimRng;
use serde::{Deserialize, Serialize};

/// How long an offered event waits for activation before expiring, in ms.
pub const EVENT_OFFER_WINDOW_MS: u64 = 30_000;

/// Minimum delay between an offer (or startup) and the next spawn, in ms.
pub const EVENT_SPAWN_MIN_MS: u64 = 300_000;

/// Maximum delay between an offer (or startup) and the next spawn, in ms
/// (exclusive).
pub const EVENT_SPAWN_MAX_MS: u64 = 600_000;

/// An event offered to the player, awaiting activation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PendingEvent {
    pub event: EventTypeId,
    pub spawned_at: u64,
    pub expires_at: u64,
}

/// An event currently modifying the economy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActiveEvent {
    pub event: EventTypeId,
    pub activated_at: u64,
    pub ends_at: u64,
}

/// Mutable event-system state. Part of the game state and persisted with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventState {
    pub pending: Option<PendingEvent>,
    pub active: Option<ActiveEvent>,
    /// Absolute wall-clock time of the next spawn opportunity, in ms.
    /// Zero means unscheduled; the engine schedules on startup and load.
    pub next_spawn_at: u64,
}

impl EventState {
    pub fn new() -> Self {
        Self {
            pending: None,
            active: None,
            next_spawn_at: 0,
        }
    }
}

impl Default for EventState {
    fn default() -> Self {
        Self::new()
    }
}

/// Draw the next spawn time: a uniformly random offset in
/// `[EVENT_SPAWN_MIN_MS, EVENT_SPAWN_MAX_MS)` from `now_ms`.
pub fn schedule_next_spawn(now_ms: u64, rng: &mut SimRng) -> u64 {
    now_ms + EVENT_SPAWN_MIN_MS + rng.next_below(EVENT_SPAWN_MAX_MS - EVENT_SPAWN_MIN_MS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_has_nothing_scheduled() {
        let state = EventState::new();
        assert!(state.pending.is_none());
        assert!(state.active.is_none());
        assert_eq!(state.next_spawn_at, 0);
    }

    #[test]
    fn spawn_offset_stays_in_window() {
        let mut rng = SimRng::new(7);
        for _ in 0..1000 {
            let at = schedule_next_spawn(1_000_000, &mut rng);
            assert!(at >= 1_000_000 + EVENT_SPAWN_MIN_MS);
            assert!(at < 1_000_000 + EVENT_SPAWN_MAX_MS);
        }
    }

    #[test]
    fn spawn_schedule_is_deterministic() {
        let mut a = SimRng::new(42);
        let mut b = SimRng::new(42);
        for _ in 0..50 {
            assert_eq!(schedule_next_spawn(5_000, &mut a), schedule_next_spawn(5_000, &mut b));
        }
    }
}

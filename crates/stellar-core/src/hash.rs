//! Deterministic state hashing for desync and regression detection.
//!
//! Two engines fed the same seed and the same command timeline must report
//! the same hash at every point. Only persisted state is hashed; derived
//! caches and notices are excluded so recomputing them never changes the
//! digest.

use crate::state::GameState;

/// A simple deterministic hash of game state.
///
/// Uses FNV-1a (64-bit) for speed and simplicity. Not cryptographic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateHash(pub u64);

impl StateHash {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    /// Start a new hash.
    pub fn new() -> Self {
        Self(Self::FNV_OFFSET)
    }

    /// Feed bytes into the hash.
    pub fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(Self::FNV_PRIME);
        }
    }

    /// Feed a u64 into the hash.
    pub fn write_u64(&mut self, v: u64) {
        self.write(&v.to_le_bytes());
    }

    /// Feed a u32 into the hash.
    pub fn write_u32(&mut self, v: u32) {
        self.write(&v.to_le_bytes());
    }

    /// Feed an f64 into the hash by its bit pattern.
    pub fn write_f64(&mut self, v: f64) {
        self.write(&v.to_bits().to_le_bytes());
    }

    /// Finalize and return the hash value.
    pub fn finish(self) -> u64 {
        self.0
    }
}

impl Default for StateHash {
    fn default() -> Self {
        Self::new()
    }
}

/// Hash every persisted field of the state plus the RNG position.
///
/// The cached global multiplier is excluded: it is rebuilt from planets
/// and achievements, which are already hashed.
pub fn state_hash(state: &GameState, rng_state: u64) -> u64 {
    let mut h = StateHash::new();
    h.write_f64(state.energy);
    h.write_f64(state.lifetime_energy);

    h.write_u32(state.generators.len() as u32);
    for gs in &state.generators {
        h.write_u32(gs.owned);
        h.write_u32(u32::from(gs.running));
        h.write_f64(gs.progress);
        h.write_u32(u32::from(gs.has_manager));
        h.write_f64(gs.lifetime_output);
    }

    h.write_u32(state.planets.len() as u32);
    for ps in &state.planets {
        h.write_u32(u32::from(ps.unlocked));
    }

    h.write_u32(state.research.len() as u32);
    for id in &state.research {
        h.write_u32(id.0);
    }

    h.write_u32(state.achievements.len() as u32);
    for id in &state.achievements {
        h.write_u32(id.0);
    }

    h.write_f64(state.prestige.dust);
    h.write_u32(state.prestige.levels.len() as u32);
    for level in &state.prestige.levels {
        h.write_u32(*level);
    }
    h.write_u32(state.prestige.times_prestiged);

    if let Some(pending) = &state.events.pending {
        h.write_u32(1);
        h.write_u32(pending.event.0);
        h.write_u64(pending.spawned_at);
        h.write_u64(pending.expires_at);
    } else {
        h.write_u32(0);
    }
    if let Some(active) = &state.events.active {
        h.write_u32(1);
        h.write_u32(active.event.0);
        h.write_u64(active.activated_at);
        h.write_u64(active.ends_at);
    } else {
        h.write_u32(0);
    }
    h.write_u64(state.events.next_spawn_at);

    h.write_u64(state.stats.manual_runs);
    h.write_f64(state.stats.playtime_seconds);
    h.write_u32(state.buy_quantity as u32);
    h.write_u64(state.last_checkpoint_ms);

    h.write_u64(rng_state);
    h.finish()
}

//! Save serialization with a versioned envelope.
//!
//! Saves are written as a two-layer `bitcode` blob: a [`Snapshot`] envelope
//! holding a [`SnapshotHeader`] plus an opaque payload, and the payload
//! itself, a [`SaveData`]. The split lets the loader check magic and
//! version before touching the payload, and hand old payloads to the
//! migration registry untouched.
//!
//! Loading never trusts the payload: [`SaveData::into_state`] resizes
//! vectors to the current content registry, resolves name keys and drops
//! unknown ones, and clamps every numeric field to its valid range.

use crate::id::EventTypeId;
use crate::migration::{MigrationError, MigrationRegistry};
use crate::registry::ContentRegistry;
use crate::rng::SimRng;
use crate::state::{BuyQuantity, GameState, GeneratorState, PlanetState, Statistics};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic number identifying a save envelope.
pub const SAVE_MAGIC: u32 = 0x5EE0_DDA7;

/// Current save format version. Increment when breaking the payload format.
pub const SAVE_VERSION: u32 = 2;

/// Dust upgrade keys renamed across releases: (old name, current name).
const RENAMED_DUST_KEYS: [(&str, &str); 2] = [
    ("dust_click", "dust_speed"),
    ("dust_production", "dust_revenue"),
];

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can occur while encoding, decoding or storing a save.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", SAVE_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("save from future version {0} (this build supports up to {SAVE_VERSION})")]
    FutureVersion(u32),
    #[error("unsupported save version: expected {}, got {}", SAVE_VERSION, .0)]
    UnsupportedVersion(u32),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Migration(#[from] MigrationError),
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// Header at the front of every save. Enables format detection and version
/// checking before attempting to decode the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotHeader {
    /// Magic number for format detection.
    pub magic: u32,
    /// Payload format version.
    pub version: u32,
}

impl SnapshotHeader {
    /// Create a header for the current format version.
    pub fn new() -> Self {
        Self {
            magic: SAVE_MAGIC,
            version: SAVE_VERSION,
        }
    }

    /// Validate the header. Returns `Ok(())` if valid.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        if self.magic != SAVE_MAGIC {
            return Err(SnapshotError::InvalidMagic(self.magic));
        }
        if self.version > SAVE_VERSION {
            return Err(SnapshotError::FutureVersion(self.version));
        }
        if self.version < SAVE_VERSION {
            return Err(SnapshotError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

impl Default for SnapshotHeader {
    fn default() -> Self {
        Self::new()
    }
}

/// The on-disk save: a validated header plus the opaque payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub header: SnapshotHeader,
    pub payload: Vec<u8>,
}

// ---------------------------------------------------------------------------
// Save payload
// ---------------------------------------------------------------------------

/// A timed event captured in a save, keyed by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedEvent {
    pub name: String,
    pub started_at: u64,
    pub until: u64,
}

/// Event machinery state captured in a save.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventSaveData {
    pub pending: Option<SavedEvent>,
    pub active: Option<SavedEvent>,
    pub next_spawn_at: u64,
}

/// The serializable portion of a run.
///
/// Generators and planets are stored densely in registry order; research,
/// achievements and dust levels are keyed by name so saves survive content
/// reordering and renames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveData {
    pub energy: f64,
    pub lifetime_energy: f64,
    pub generators: Vec<GeneratorState>,
    pub planets: Vec<PlanetState>,
    pub research: Vec<String>,
    pub achievements: Vec<String>,
    pub dust: f64,
    pub dust_levels: Vec<(String, u32)>,
    pub times_prestiged: u32,
    pub events: EventSaveData,
    pub stats: Statistics,
    pub buy_quantity: BuyQuantity,
    pub last_checkpoint_ms: u64,
    pub rng: SimRng,
}

impl SaveData {
    /// Capture the current run for writing.
    pub fn capture(state: &GameState, rng: &SimRng, registry: &ContentRegistry) -> Self {
        let saved_event = |event: EventTypeId, started_at: u64, until: u64| SavedEvent {
            name: registry.event(event).name.clone(),
            started_at,
            until,
        };

        SaveData {
            energy: state.energy,
            lifetime_energy: state.lifetime_energy,
            generators: state.generators.clone(),
            planets: state.planets.clone(),
            research: state
                .research
                .iter()
                .map(|id| registry.research(*id).name.clone())
                .collect(),
            achievements: state
                .achievements
                .iter()
                .map(|id| registry.achievement(*id).name.clone())
                .collect(),
            dust: state.prestige.dust,
            dust_levels: registry
                .dust_upgrades()
                .iter()
                .enumerate()
                .map(|(i, def)| {
                    let level = state.prestige.level(crate::id::DustUpgradeId(i as u32));
                    (def.name.clone(), level)
                })
                .collect(),
            times_prestiged: state.prestige.times_prestiged,
            events: EventSaveData {
                pending: state
                    .events
                    .pending
                    .as_ref()
                    .map(|p| saved_event(p.event, p.spawned_at, p.expires_at)),
                active: state
                    .events
                    .active
                    .as_ref()
                    .map(|a| saved_event(a.event, a.activated_at, a.ends_at)),
                next_spawn_at: state.events.next_spawn_at,
            },
            stats: state.stats.clone(),
            buy_quantity: state.buy_quantity,
            last_checkpoint_ms: state.last_checkpoint_ms,
            rng: rng.clone(),
        }
    }

    /// Rebuild runtime state against the current content registry.
    ///
    /// This is total: whatever the payload held, the result is a state the
    /// engine can run. Unknown names are dropped, vectors are resized to
    /// the registry, and numerics are clamped to sane ranges.
    pub fn into_state(self, registry: &ContentRegistry) -> (GameState, SimRng) {
        let mut state = GameState::fresh(registry);

        state.energy = clean_amount(self.energy);
        state.lifetime_energy = clean_amount(self.lifetime_energy);

        for (i, mut gs) in self
            .generators
            .into_iter()
            .take(registry.generator_count())
            .enumerate()
        {
            gs.progress = if gs.progress.is_finite() {
                gs.progress.clamp(0.0, 1.0)
            } else {
                0.0
            };
            gs.lifetime_output = clean_amount(gs.lifetime_output);
            if gs.owned == 0 {
                gs.running = false;
                gs.progress = 0.0;
            }
            state.generators[i] = gs;
        }

        for (i, ps) in self
            .planets
            .into_iter()
            .take(registry.planet_count())
            .enumerate()
        {
            state.planets[i] = ps;
        }

        state.research = resolve_names(&self.research, |name| registry.research_id(name));
        state.achievements = resolve_names(&self.achievements, |name| {
            registry.achievement_id(name)
        });

        state.prestige.dust = clean_amount(self.dust);
        state.prestige.times_prestiged = self.times_prestiged;
        for (name, level) in &self.dust_levels {
            let current = RENAMED_DUST_KEYS
                .iter()
                .find(|(old, _)| old == name)
                .map(|(_, new)| *new)
                .unwrap_or(name.as_str());
            match registry.dust_upgrade_id(current) {
                Some(id) => {
                    let max = registry.dust_upgrade(id).max_level;
                    state.prestige.levels[id.0 as usize] = (*level).min(max);
                }
                None => {
                    tracing::debug!(name = %name, "dropping unknown dust upgrade from save");
                }
            }
        }

        let resolve_event = |saved: &SavedEvent| {
            let id = registry.event_id(&saved.name);
            if id.is_none() {
                tracing::debug!(name = %saved.name, "dropping unknown event from save");
            }
            id
        };
        if let Some(pending) = &self.events.pending {
            state.events.pending =
                resolve_event(pending).map(|event| crate::event::PendingEvent {
                    event,
                    spawned_at: pending.started_at,
                    expires_at: pending.until,
                });
        }
        if let Some(active) = &self.events.active {
            state.events.active = resolve_event(active).map(|event| crate::event::ActiveEvent {
                event,
                activated_at: active.started_at,
                ends_at: active.until,
            });
        }
        state.events.next_spawn_at = self.events.next_spawn_at;

        state.stats = self.stats;
        if !state.stats.playtime_seconds.is_finite() || state.stats.playtime_seconds < 0.0 {
            state.stats.playtime_seconds = 0.0;
        }
        state.buy_quantity = self.buy_quantity;
        state.last_checkpoint_ms = self.last_checkpoint_ms;

        (state, self.rng)
    }
}

fn clean_amount(v: f64) -> f64 {
    if v.is_finite() && v >= 0.0 { v } else { 0.0 }
}

fn resolve_names<I: Ord + Copy>(
    names: &[String],
    lookup: impl Fn(&str) -> Option<I>,
) -> BTreeSet<I> {
    let mut out = BTreeSet::new();
    for name in names {
        match lookup(name) {
            Some(id) => {
                out.insert(id);
            }
            None => {
                tracing::debug!(name = %name, "dropping unknown name from save");
            }
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Encode / decode
// ---------------------------------------------------------------------------

/// Encode a payload into a versioned envelope.
pub fn encode_snapshot(data: &SaveData) -> Result<Vec<u8>, SnapshotError> {
    let payload = bitcode::serialize(data).map_err(|e| SnapshotError::Encode(e.to_string()))?;
    let snapshot = Snapshot {
        header: SnapshotHeader::new(),
        payload,
    };
    bitcode::serialize(&snapshot).map_err(|e| SnapshotError::Encode(e.to_string()))
}

fn decode_payload(payload: &[u8]) -> Result<SaveData, SnapshotError> {
    bitcode::deserialize(payload).map_err(|e| SnapshotError::Decode(e.to_string()))
}

/// Decode an envelope at the current format version.
pub fn decode_snapshot(data: &[u8]) -> Result<SaveData, SnapshotError> {
    let snapshot: Snapshot =
        bitcode::deserialize(data).map_err(|e| SnapshotError::Decode(e.to_string()))?;
    snapshot.header.validate()?;
    decode_payload(&snapshot.payload)
}

/// Decode an envelope, routing old payloads through the migration registry.
///
/// Current-version saves behave like [`decode_snapshot`]. Older versions are
/// migrated step by step before decoding. Future versions are refused.
pub fn decode_snapshot_with_migrations(
    data: &[u8],
    migrations: &MigrationRegistry,
) -> Result<SaveData, SnapshotError> {
    let snapshot: Snapshot =
        bitcode::deserialize(data).map_err(|e| SnapshotError::Decode(e.to_string()))?;
    match snapshot.header.validate() {
        Ok(()) => decode_payload(&snapshot.payload),
        Err(SnapshotError::UnsupportedVersion(old)) => {
            let migrated = migrations.migrate(&snapshot.payload, old, SAVE_VERSION)?;
            decode_payload(&migrated)
        }
        Err(other) => Err(other),
    }
}

// ---------------------------------------------------------------------------
// Save stores
// ---------------------------------------------------------------------------

/// Where encoded saves live. The engine drives checkpoints through this
/// seam; tests and headless runs use the in-memory store.
pub trait SaveStore {
    fn save(&mut self, bytes: &[u8]) -> std::io::Result<()>;
    fn load(&self) -> std::io::Result<Option<Vec<u8>>>;
    fn clear(&mut self) -> std::io::Result<()>;
}

/// Single-file store.
#[derive(Debug, Clone)]
pub struct FileSaveStore {
    path: PathBuf,
}

impl FileSaveStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl SaveStore for FileSaveStore {
    fn save(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        std::fs::write(&self.path, bytes)
    }

    fn load(&self) -> std::io::Result<Option<Vec<u8>>> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn clear(&mut self) -> std::io::Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// In-memory store for tests and headless runs.
#[derive(Debug, Clone, Default)]
pub struct MemorySaveStore {
    data: Option<Vec<u8>>,
}

impl MemorySaveStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SaveStore for MemorySaveStore {
    fn save(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.data = Some(bytes.to_vec());
        Ok(())
    }

    fn load(&self) -> std::io::Result<Option<Vec<u8>>> {
        Ok(self.data.clone())
    }

    fn clear(&mut self) -> std::io::Result<()> {
        self.data = None;
        Ok(())
    }
}

// ===========================================================================
// Tests
// ===========================================================================

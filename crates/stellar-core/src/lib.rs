//! Stellar Core -- the simulation engine for an incremental space game.
//!
//! This crate provides the deterministic numeric model behind the game:
//! generators with discrete production cycles, geometric cost curves,
//! milestone doubling, planets, research, timed events, achievements,
//! prestige resets, offline catch-up, and versioned persistence. No
//! rendering, no platform bindings; a frontend drives the engine with
//! commands and clock values and draws whatever the state says.
//!
//! # Tick Pipeline
//!
//! Each call to [`engine::GameEngine::tick`] advances the run through the
//! following phases:
//!
//! 1. **Commands** -- Drain the queue and apply each player action.
//! 2. **Production** -- Advance running generators, credit completed cycles.
//! 3. **Events** -- Spawn offers, expire the pending offer and the active
//!    event.
//! 4. **Achievements** -- Periodic predicate sweep over the state.
//! 5. **Notices** -- Drop expired player-facing notices.
//!
//! Everything observable is a function of the seed, the command timeline,
//! and the clock values passed in. The engine never reads the wall clock,
//! so identical inputs replay to identical state hashes.
//!
//! # Key Types
//!
//! - [`engine::GameEngine`] -- Main engine and pipeline orchestrator.
//! - [`registry::ContentRegistry`] -- Immutable definitions for generators,
//!   planets, research, dust upgrades, events, and achievements (frozen at
//!   startup).
//! - [`state::GameState`] -- The mutable run state, dense vectors indexed
//!   by registry IDs.
//! - [`bonus::Bonuses`] -- Aggregate of every multiplier source, rebuilt
//!   when a source changes.
//! - [`rng::SimRng`] -- Deterministic random stream, persisted in saves.
//! - [`serialize`] -- Versioned snapshot encoding via bitcode, with
//!   migration support for old saves.

pub mod achievement;
pub mod bonus;
pub mod command;
pub mod economy;
pub mod engine;
pub mod event;
pub mod hash;
pub mod id;
pub mod migration;
pub mod notify;
pub mod offline;
pub mod prestige;
pub mod registry;
pub mod research;
pub mod rng;
pub mod serialize;
pub mod state;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

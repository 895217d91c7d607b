//! Content data files for the stellar engine.
//!
//! Ships the serde schema for content definition files (RON, JSON, or TOML),
//! a format-detecting loader that resolves name references and assembles a
//! [`stellar_core::registry::ContentRegistry`], and the canonical content set
//! under `data/`.

pub mod loader;
pub mod schema;

pub use loader::{canonical_registry, load_content, DataLoadError};

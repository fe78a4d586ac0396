//! Budget Planner configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for history.json (historical dataset) and schema.json
//!   (feature schema)
//! - Built-in variants and the built-in historical fixture
//! - Config resolution (CLI → env → XDG → system → built-in)
//! - Semantic validation
//! - Config snapshots for reproducibility

pub mod history;
pub mod preset;
pub mod resolve;
pub mod schema;
pub mod snapshot;
pub mod validate;

pub use history::{HistoricalDataset, HistoricalRecord, Target};
pub use preset::{Variant, VariantError};
pub use resolve::{resolve_config, ConfigPaths, ConfigSource};
pub use schema::{Coercion, FallbackSpec, FeatureNote, FeatureSchema, FieldSpec};
pub use snapshot::ConfigSnapshot;
pub use validate::{ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";

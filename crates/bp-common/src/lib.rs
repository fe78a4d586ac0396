//! Budget Planner common types and errors.
//!
//! This crate provides foundational types shared across bp-core modules:
//! - Common error types with stable codes
//! - Output format specifications
//! - Schema versioning for machine-readable output

pub mod error;
pub mod output;

pub use error::{Error, ErrorCategory, Result};
pub use output::OutputFormat;

/// Version of the JSON output contract.
pub const SCHEMA_VERSION: &str = "1.0.0";

//! Configuration snapshots for reproducibility.
//!
//! A snapshot records which history and schema files a prediction used, with
//! content hashes, so a result can be traced back to its exact inputs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::resolve::{ConfigPaths, ConfigSource};
use crate::{FeatureSchema, HistoricalDataset};

/// A frozen snapshot of configuration state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    /// When this snapshot was taken.
    pub timestamp: DateTime<Utc>,

    /// Schema version of the configuration.
    pub schema_version: String,

    /// SHA-256 hash of the history JSON content.
    #[serde(default)]
    pub history_hash: Option<String>,

    #[serde(default)]
    pub history_path: Option<String>,

    pub history_source: String,

    /// SHA-256 hash of the schema JSON content.
    #[serde(default)]
    pub schema_hash: Option<String>,

    #[serde(default)]
    pub schema_path: Option<String>,

    pub schema_source: String,

    /// Combined hash of all config files (for quick comparison).
    pub combined_hash: String,

    /// Key configuration values for quick reference.
    pub summary: ConfigSummary,
}

/// Summary of key configuration values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSummary {
    pub schema_name: String,
    pub feature_count: usize,
    pub record_count: usize,
    pub years: Vec<i32>,
    pub next_year: i32,
}

impl ConfigSummary {
    fn build(schema: &FeatureSchema, history: &HistoricalDataset) -> Self {
        ConfigSummary {
            schema_name: schema.name.clone(),
            feature_count: schema.n_features(),
            record_count: history.len(),
            years: history.years(),
            next_year: schema.next_year,
        }
    }
}

impl ConfigSnapshot {
    /// Create a new snapshot from loaded configuration.
    ///
    /// `history_json` / `schema_json` are the raw file contents when the
    /// corresponding file was read from disk.
    pub fn new(
        schema: &FeatureSchema,
        history: &HistoricalDataset,
        paths: &ConfigPaths,
        history_json: Option<&str>,
        schema_json: Option<&str>,
    ) -> Self {
        let history_hash = history_json.map(hash_content);
        let schema_hash = schema_json.map(hash_content);

        let combined = format!(
            "{}:{}:{}",
            history_hash.as_deref().unwrap_or("builtin"),
            schema_hash.as_deref().unwrap_or("builtin"),
            schema.name
        );

        ConfigSnapshot {
            timestamp: Utc::now(),
            schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
            history_hash,
            history_path: paths.history.as_ref().map(|p| p.display().to_string()),
            history_source: paths.history_source.to_string(),
            schema_hash,
            schema_path: paths.schema.as_ref().map(|p| p.display().to_string()),
            schema_source: paths.schema_source.to_string(),
            combined_hash: hash_content(&combined),
            summary: ConfigSummary::build(schema, history),
        }
    }

    /// Create a snapshot of the built-in configuration.
    pub fn defaults_only(schema: &FeatureSchema) -> Self {
        let paths = ConfigPaths {
            history_source: ConfigSource::BuiltinDefault,
            schema_source: ConfigSource::BuiltinDefault,
            ..ConfigPaths::default()
        };
        Self::new(schema, &HistoricalDataset::builtin(), &paths, None, None)
    }

    /// Serialize snapshot to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize snapshot from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Check if this snapshot matches another (same config).
    pub fn matches(&self, other: &ConfigSnapshot) -> bool {
        self.combined_hash == other.combined_hash
    }

    /// First 12 chars of the combined hash.
    pub fn short_id(&self) -> &str {
        &self.combined_hash[..12.min(self.combined_hash.len())]
    }
}

/// Hash content with SHA-256 and return hex string.
fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

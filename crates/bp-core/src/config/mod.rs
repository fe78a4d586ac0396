//! Configuration loading and validation for bp-core.
//!
//! This module handles:
//! - Loading history.json and schema.json files
//! - Config resolution order (CLI > config dir > env > XDG > system > built-in)
//! - Schema selection (explicit file, built-in variant, discovered file)
//! - Semantic validation of each file
//! - Config snapshot generation
//!
//! History/schema compatibility is not checked here. A schema that reads a
//! column the history lacks is a prediction failure and yields the fallback;
//! `check` reports it up front.

pub use bp_config::resolve::{HISTORY_FILENAME, SCHEMA_FILENAME};
pub use bp_config::validate::ValidationError;
pub use bp_config::{ConfigPaths, ConfigSnapshot, ConfigSource, FeatureSchema, HistoricalDataset, Variant};

use crate::logging::{event_names, Stage};
use bp_config::validate::{validate_history, validate_schema};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Which configuration file an error concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFile {
    History,
    Schema,
}

impl std::fmt::Display for ConfigFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigFile::History => write!(f, "history"),
            ConfigFile::Schema => write!(f, "schema"),
        }
    }
}

/// Errors that can occur during config loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{file} file not found: {path}")]
    NotFound { file: ConfigFile, path: PathBuf },

    #[error("I/O error reading {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {file} file {path}: {source}")]
    ParseError {
        file: ConfigFile,
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{file} validation failed for {path}: {source}")]
    ValidationError {
        file: ConfigFile,
        path: String,
        #[source]
        source: ValidationError,
    },
}

impl From<ConfigError> for bp_common::Error {
    fn from(err: ConfigError) -> Self {
        let file = match &err {
            ConfigError::ParseError { file, .. } | ConfigError::ValidationError { file, .. } => Some(*file),
            ConfigError::NotFound { .. } | ConfigError::IoError { .. } => None,
        };
        match file {
            Some(ConfigFile::History) => bp_common::Error::InvalidHistory(err.to_string()),
            Some(ConfigFile::Schema) => bp_common::Error::InvalidSchema(err.to_string()),
            None => bp_common::Error::Config(err.to_string()),
        }
    }
}

/// Configuration resolution options.
#[derive(Debug, Default, Clone)]
pub struct ConfigOptions {
    /// Explicit config directory, searched before the environment chain.
    pub config_dir: Option<PathBuf>,
    /// Explicit history.json path.
    pub history_path: Option<PathBuf>,
    /// Explicit schema.json path; wins over `variant`.
    pub schema_path: Option<PathBuf>,
    /// Built-in schema variant; wins over a discovered schema.json.
    pub variant: Option<Variant>,
}

/// Loaded configuration with provenance.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema: FeatureSchema,
    pub history: HistoricalDataset,
    pub paths: ConfigPaths,
    pub snapshot: ConfigSnapshot,
}

/// Load history and schema with the standard resolution order.
///
/// Each file is resolved as:
/// 1. Explicit path in `options` (must exist)
/// 2. `config_dir/<file>` when present
/// 3. `BP_HISTORY`/`BP_SCHEMA`, `BP_CONFIG_DIR`, XDG, /etc/budget-planner
/// 4. Built-in defaults
///
/// A `variant` replaces any discovered schema.json but not an explicit one.
pub fn load_config(options: &ConfigOptions) -> Result<ResolvedConfig, ConfigError> {
    let mut paths = resolve_paths(options);

    let (history, history_json) = match &paths.history {
        Some(path) => {
            let (history, content) = load_history_from_file(path)?;
            (history, Some(content))
        }
        None => {
            tracing::debug!(
                target: event_names::CONFIG_DEFAULT_USED,
                stage = %Stage::Config,
                file = "history",
                "using built-in history"
            );
            (HistoricalDataset::builtin(), None)
        }
    };

    let (schema, schema_json) = match (&paths.schema, options.variant) {
        (Some(path), _) if options.schema_path.is_some() => {
            let (schema, content) = load_schema_from_file(path)?;
            (schema, Some(content))
        }
        (_, Some(variant)) => {
            paths.schema = None;
            paths.schema_source = ConfigSource::BuiltinDefault;
            (variant.schema(), None)
        }
        (Some(path), None) => {
            let (schema, content) = load_schema_from_file(path)?;
            (schema, Some(content))
        }
        (None, None) => {
            tracing::debug!(
                target: event_names::CONFIG_DEFAULT_USED,
                stage = %Stage::Config,
                file = "schema",
                variant = %Variant::default(),
                "using built-in schema"
            );
            (Variant::default().schema(), None)
        }
    };

    let snapshot = ConfigSnapshot::new(
        &schema,
        &history,
        &paths,
        history_json.as_deref(),
        schema_json.as_deref(),
    );

    tracing::info!(
        target: event_names::CONFIG_LOADED,
        stage = %Stage::Config,
        schema = %schema.name,
        records = history.len() as u64,
        history_source = %paths.history_source,
        schema_source = %paths.schema_source,
        snapshot = snapshot.short_id(),
        "configuration loaded"
    );

    Ok(ResolvedConfig {
        schema,
        history,
        paths,
        snapshot,
    })
}

/// Resolve file paths without reading them.
pub fn resolve_paths(options: &ConfigOptions) -> ConfigPaths {
    let mut paths = bp_config::resolve_config(
        options.history_path.as_deref(),
        options.schema_path.as_deref(),
    );

    if let Some(dir) = &options.config_dir {
        if options.history_path.is_none() {
            let candidate = dir.join(HISTORY_FILENAME);
            if candidate.exists() {
                paths.history = Some(candidate);
                paths.history_source = ConfigSource::CliArgument;
            }
        }
        if options.schema_path.is_none() {
            let candidate = dir.join(SCHEMA_FILENAME);
            if candidate.exists() {
                paths.schema = Some(candidate);
                paths.schema_source = ConfigSource::CliArgument;
            }
        }
    }

    paths
}

fn read_config_file(file: ConfigFile, path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| {
        let err = if source.kind() == std::io::ErrorKind::NotFound {
            ConfigError::NotFound {
                file,
                path: path.to_path_buf(),
            }
        } else {
            ConfigError::IoError {
                path: path.to_path_buf(),
                source,
            }
        };
        tracing::warn!(
            target: event_names::CONFIG_ERROR,
            stage = %Stage::Config,
            file = %file,
            path = %path.display(),
            "{}",
            err
        );
        err
    })
}

fn invalid(file: ConfigFile, path: &Path, source: ValidationError) -> ConfigError {
    let err = ConfigError::ValidationError {
        file,
        path: path.display().to_string(),
        source,
    };
    tracing::warn!(
        target: event_names::CONFIG_ERROR,
        stage = %Stage::Config,
        file = %file,
        "{}",
        err
    );
    err
}

/// Read, parse and validate a history file. Returns the raw content for hashing.
pub fn load_history_from_file(path: &Path) -> Result<(HistoricalDataset, String), ConfigError> {
    let content = read_config_file(ConfigFile::History, path)?;
    let history: HistoricalDataset =
        serde_json::from_str(&content).map_err(|source| ConfigError::ParseError {
            file: ConfigFile::History,
            path: path.to_path_buf(),
            source,
        })?;
    validate_history(&history).map_err(|e| invalid(ConfigFile::History, path, e))?;
    Ok((history, content))
}

/// Read, parse and validate a schema file. Returns the raw content for hashing.
pub fn load_schema_from_file(path: &Path) -> Result<(FeatureSchema, String), ConfigError> {
    let content = read_config_file(ConfigFile::Schema, path)?;
    let schema: FeatureSchema =
        serde_json::from_str(&content).map_err(|source| ConfigError::ParseError {
            file: ConfigFile::Schema,
            path: path.to_path_buf(),
            source,
        })?;
    validate_schema(&schema).map_err(|e| invalid(ConfigFile::Schema, path, e))?;
    Ok((schema, content))
}

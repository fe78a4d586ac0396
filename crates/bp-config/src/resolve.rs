//! Configuration resolution and path discovery.
//!
//! Resolution order: CLI arguments → environment variables → XDG paths → system → built-in.

use std::path::{Path, PathBuf};

/// Discovered configuration file paths.
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    /// Path to history.json (or None if not found).
    pub history: Option<PathBuf>,

    /// Path to schema.json (or None if not found).
    pub schema: Option<PathBuf>,

    /// Source of the history file (for diagnostics).
    pub history_source: ConfigSource,

    /// Source of the schema file (for diagnostics).
    pub schema_source: ConfigSource,
}

/// Where a configuration file was found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided via CLI argument.
    CliArgument,

    /// Set via environment variable.
    Environment,

    /// Found in XDG config directory.
    XdgConfig,

    /// Found in /etc/budget-planner/.
    SystemConfig,

    /// Using built-in defaults.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::SystemConfig => write!(f, "system config"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// Environment variable names.
pub const ENV_HISTORY_PATH: &str = "BP_HISTORY";
pub const ENV_SCHEMA_PATH: &str = "BP_SCHEMA";
pub const ENV_CONFIG_DIR: &str = "BP_CONFIG_DIR";

/// Standard config file names.
pub const HISTORY_FILENAME: &str = "history.json";
pub const SCHEMA_FILENAME: &str = "schema.json";

/// Application name for XDG directories.
const APP_NAME: &str = "budget-planner";

/// Resolve configuration paths using the standard resolution order.
///
/// Resolution order for each config file:
/// 1. Explicit CLI path (used even if it does not exist, so loading reports it)
/// 2. Environment variable (BP_HISTORY, BP_SCHEMA)
/// 3. BP_CONFIG_DIR environment variable + filename
/// 4. XDG config directory (~/.config/budget-planner/)
/// 5. System config (/etc/budget-planner/)
/// 6. Built-in defaults (None)
pub fn resolve_config(cli_history: Option<&Path>, cli_schema: Option<&Path>) -> ConfigPaths {
    let mut paths = ConfigPaths::default();

    paths.history = resolve_single_config(
        cli_history,
        ENV_HISTORY_PATH,
        HISTORY_FILENAME,
        &mut paths.history_source,
    );

    paths.schema = resolve_single_config(
        cli_schema,
        ENV_SCHEMA_PATH,
        SCHEMA_FILENAME,
        &mut paths.schema_source,
    );

    paths
}

/// Resolve a single configuration file path.
fn resolve_single_config(
    cli_path: Option<&Path>,
    env_var: &str,
    filename: &str,
    source: &mut ConfigSource,
) -> Option<PathBuf> {
    // 1. CLI argument
    if let Some(path) = cli_path {
        *source = ConfigSource::CliArgument;
        return Some(path.to_path_buf());
    }

    // 2. Environment variable (direct path)
    if let Some(env_path) = std::env::var_os(env_var) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            *source = ConfigSource::Environment;
            return Some(path);
        }
    }

    // 3. Environment variable (config dir)
    if let Some(config_dir) = std::env::var_os(ENV_CONFIG_DIR) {
        let path = PathBuf::from(config_dir).join(filename);
        if path.exists() {
            *source = ConfigSource::Environment;
            return Some(path);
        }
    }

    // 4. XDG config directory
    if let Some(dir) = xdg_config_dir() {
        let path = dir.join(filename);
        if path.exists() {
            *source = ConfigSource::XdgConfig;
            return Some(path);
        }
    }

    // 5. System config
    let system_path = system_config_dir().join(filename);
    if system_path.exists() {
        *source = ConfigSource::SystemConfig;
        return Some(system_path);
    }

    *source = ConfigSource::BuiltinDefault;
    None
}

/// Get the XDG config directory for budget-planner.
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Get the system config directory.
pub fn system_config_dir() -> PathBuf {
    PathBuf::from("/etc").join(APP_NAME)
}

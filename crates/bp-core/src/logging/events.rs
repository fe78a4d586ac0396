//! Structured event vocabulary.
//!
//! Events are emitted with the event name as the tracing target and a
//! `stage` field, so JSONL consumers can filter on stable keys.

use serde::{Deserialize, Serialize};

/// Log levels for events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => Level::Trace,
            tracing::Level::DEBUG => Level::Debug,
            tracing::Level::INFO => Level::Info,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::ERROR => Level::Error,
        }
    }
}

/// Processing stages of a single invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Startup and argument handling.
    Init,
    /// Resolving and reading history/schema files.
    Config,
    /// Coercing planning inputs.
    Input,
    /// Fitting per-target models.
    Train,
    /// Producing the next-year figures.
    Predict,
    /// Rendering output.
    Render,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Init => "init",
            Stage::Config => "config",
            Stage::Input => "input",
            Stage::Train => "train",
            Stage::Predict => "predict",
            Stage::Render => "render",
        };
        write!(f, "{}", s)
    }
}

/// Standard event names used in logging.
pub mod event_names {
    // Run lifecycle
    pub const RUN_STARTED: &str = "run.started";
    pub const RUN_FINISHED: &str = "run.finished";

    // Config
    pub const CONFIG_LOADED: &str = "config.loaded";
    pub const CONFIG_DEFAULT_USED: &str = "config.default_used";
    pub const CONFIG_ERROR: &str = "config.error";

    // Input
    pub const INPUT_PARSED: &str = "input.parsed";

    // Train stage
    pub const TRAIN_TARGET_FITTED: &str = "train.target_fitted";

    // Predict stage
    pub const PREDICT_STARTED: &str = "predict.started";
    pub const PREDICT_CLAMPED: &str = "predict.clamped";
    pub const PREDICT_FINISHED: &str = "predict.finished";
    pub const PREDICT_FALLBACK: &str = "predict.fallback";

    pub const INTERNAL_ERROR: &str = "internal_error";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_display_matches_serde() {
        for stage in [
            Stage::Init,
            Stage::Config,
            Stage::Input,
            Stage::Train,
            Stage::Predict,
            Stage::Render,
        ] {
            let json = serde_json::to_string(&stage).unwrap();
            assert_eq!(json, format!("\"{}\"", stage));
        }
    }

    #[test]
    fn level_from_tracing() {
        assert_eq!(Level::from(tracing::Level::INFO), Level::Info);
        assert_eq!(Level::from(tracing::Level::ERROR), Level::Error);
    }

    #[test]
    fn event_names_are_dotted() {
        for name in [
            event_names::PREDICT_STARTED,
            event_names::PREDICT_FALLBACK,
            event_names::TRAIN_TARGET_FITTED,
            event_names::CONFIG_LOADED,
        ] {
            assert!(name.contains('.'), "{}", name);
        }
    }
}

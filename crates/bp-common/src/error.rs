//! Error types for Budget Planner.
//!
//! This module provides structured error handling with:
//! - Stable error codes for machine parsing
//! - Category classification for error grouping
//! - Remediation suggestions for humans
//!
//! # Human-Facing Output
//!
//! ```text
//! ✗ Invalid Historical Dataset
//!   Reason: invalid history file: record 2021 is missing column gratuity
//!   Fix: Run 'bp-core check' to validate, or remove history.json to use the built-in data.
//! ```
//!
//! # Machine-Facing Output
//!
//! ```json
//! {
//!   "code": 11,
//!   "category": "config",
//!   "message": "invalid history file: record 2021 is missing column gratuity",
//!   "recoverable": true
//! }
//! ```
//!
//! Prediction failures never surface here: the predictor maps them to its
//! fallback result. These errors cover everything around the prediction
//! (loading configuration, reading input files, writing output).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Result type alias for Budget Planner operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Configuration file errors (history, schema).
    Config,
    /// Planning input errors (files, key=value pairs).
    Input,
    /// Model fitting and numerical errors.
    Prediction,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Input => write!(f, "input"),
            ErrorCategory::Prediction => write!(f, "prediction"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type for Budget Planner.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid history file: {0}")]
    InvalidHistory(String),

    #[error("invalid schema file: {0}")]
    InvalidSchema(String),

    // Input errors (20-29)
    #[error("invalid planning input: {0}")]
    InvalidInput(String),

    #[error("unsupported input format: {0}")]
    UnsupportedInputFormat(String),

    // Prediction errors (30-39)
    #[error("prediction failed: {0}")]
    Prediction(String),

    #[error("numerical instability detected: {0}")]
    NumericalInstability(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Configuration errors
    /// - 20-29: Input errors
    /// - 30-39: Prediction errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::InvalidHistory(_) => 11,
            Error::InvalidSchema(_) => 12,
            Error::InvalidInput(_) => 20,
            Error::UnsupportedInputFormat(_) => 21,
            Error::Prediction(_) => 30,
            Error::NumericalInstability(_) => 31,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) | Error::InvalidHistory(_) | Error::InvalidSchema(_) => {
                ErrorCategory::Config
            }
            Error::InvalidInput(_) | Error::UnsupportedInputFormat(_) => ErrorCategory::Input,
            Error::Prediction(_) | Error::NumericalInstability(_) => ErrorCategory::Prediction,
            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Returns whether this error is potentially recoverable by the user.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Config(_) | Error::InvalidHistory(_) | Error::InvalidSchema(_) => true,
            Error::InvalidInput(_) | Error::UnsupportedInputFormat(_) => true,
            // A degenerate history will not fit differently on retry.
            Error::Prediction(_) | Error::NumericalInstability(_) => false,
            Error::Io(_) | Error::Json(_) => true,
        }
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::Config(_) => {
                "Run 'bp-core config show' to see which files were resolved, then fix or remove them."
            }
            Error::InvalidHistory(_) => {
                "Run 'bp-core check' to validate, or remove history.json to use the built-in data."
            }
            Error::InvalidSchema(_) => {
                "Run 'bp-core check' to validate, or remove schema.json to use a built-in variant."
            }
            Error::InvalidInput(_) => {
                "Pass inputs as key=value pairs (e.g. --set promotions=20) or a JSON/TOML/YAML object."
            }
            Error::UnsupportedInputFormat(_) => {
                "Use a .json, .toml, .yaml or .yml file, or '-' to read JSON from stdin."
            }
            Error::Prediction(_) => {
                "Check that the historical dataset has at least two years and every schema column."
            }
            Error::NumericalInstability(_) => {
                "Inputs or history produced non-finite values. Check for extreme magnitudes."
            }
            Error::Io(_) => "Check that the file exists and is readable, then retry.",
            Error::Json(_) => {
                "Invalid JSON. Check syntax with 'cat <file> | jq .' or restore from backup."
            }
        }
    }

    /// Returns a short headline for human-readable output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::Config(_) => "Configuration Error",
            Error::InvalidHistory(_) => "Invalid Historical Dataset",
            Error::InvalidSchema(_) => "Invalid Feature Schema",
            Error::InvalidInput(_) => "Invalid Planning Input",
            Error::UnsupportedInputFormat(_) => "Unsupported Input Format",
            Error::Prediction(_) => "Prediction Failed",
            Error::NumericalInstability(_) => "Numerical Instability",
            Error::Io(_) => "I/O Error",
            Error::Json(_) => "JSON Parse Error",
        }
    }
}

/// Structured error response for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Stable error code.
    pub code: u32,

    /// Error category for grouping.
    pub category: ErrorCategory,

    /// Human-readable error message.
    pub message: String,

    /// Whether the error is potentially recoverable.
    pub recoverable: bool,

    /// Additional structured context (e.g., file path).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub context: BTreeMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            context: BTreeMap::new(),
        }
    }
}

impl StructuredError {
    /// Add additional context to the error.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code)
        })
    }

    /// Serialize to pretty JSON string.
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| self.to_json())
    }
}

/// Format an error for human-readable stderr output.
///
/// Output format:
/// ```text
/// ✗ [Headline]
///   Reason: [Error message]
///   Fix: [Remediation hint]
/// ```
pub fn format_error_human(err: &Error, use_color: bool) -> String {
    let (red, cyan, reset) = if use_color {
        ("\x1b[31m", "\x1b[36m", "\x1b[0m")
    } else {
        ("", "", "")
    };

    format!(
        "{red}✗{reset} {headline}\n  Reason: {message}\n  {cyan}Fix:{reset} {remediation}",
        red = red,
        cyan = cyan,
        reset = reset,
        headline = err.headline(),
        message = err,
        remediation = err.remediation()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(Error::Config("test".into()).code(), 10);
        assert_eq!(Error::InvalidHistory("x".into()).code(), 11);
        assert_eq!(Error::InvalidInput("x".into()).code(), 20);
        assert_eq!(Error::NumericalInstability("x".into()).code(), 31);
    }

    #[test]
    fn test_error_category() {
        assert_eq!(Error::InvalidSchema("x".into()).category(), ErrorCategory::Config);
        assert_eq!(
            Error::UnsupportedInputFormat("csv".into()).category(),
            ErrorCategory::Input
        );
        assert_eq!(Error::Prediction("x".into()).category(), ErrorCategory::Prediction);
        let io = Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(io.category(), ErrorCategory::Io);
    }

    #[test]
    fn test_recoverability() {
        assert!(Error::InvalidInput("x".into()).is_recoverable());
        assert!(!Error::Prediction("x".into()).is_recoverable());
    }

    #[test]
    fn test_structured_error_serialization() {
        let err = Error::InvalidHistory("record 2021 is missing column gratuity".into());
        let structured = StructuredError::from(&err).with_context("file", "history.json");
        let json: serde_json::Value = serde_json::from_str(&structured.to_json()).unwrap();
        assert_eq!(json["code"], 11);
        assert_eq!(json["category"], "config");
        assert_eq!(json["recoverable"], true);
        assert_eq!(json["context"]["file"], "history.json");
    }

    #[test]
    fn test_format_error_human_plain() {
        let err = Error::UnsupportedInputFormat("csv".into());
        let text = format_error_human(&err, false);
        assert!(text.starts_with("✗ Unsupported Input Format"));
        assert!(text.contains("Reason: unsupported input format: csv"));
        assert!(text.contains("Fix: Use a .json"));
    }
}

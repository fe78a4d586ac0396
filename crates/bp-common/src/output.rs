//! Output format specifications.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Supported output formats for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Pretty-printed JSON (default for machine consumption)
    #[default]
    Json,

    /// Human-readable Markdown tables
    Md,

    /// One-line summary for quick status checks
    Summary,

    /// Export report with INR-formatted amounts
    Report,
}

impl OutputFormat {
    /// Whether this format is meant to be parsed by another program.
    pub fn is_machine_readable(self) -> bool {
        matches!(self, OutputFormat::Json | OutputFormat::Report)
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Md => write!(f, "md"),
            OutputFormat::Summary => write!(f, "summary"),
            OutputFormat::Report => write!(f, "report"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_json() {
        assert_eq!(OutputFormat::default(), OutputFormat::Json);
    }

    #[test]
    fn display_matches_serde() {
        for format in [
            OutputFormat::Json,
            OutputFormat::Md,
            OutputFormat::Summary,
            OutputFormat::Report,
        ] {
            let json = serde_json::to_value(format).unwrap();
            assert_eq!(json, serde_json::Value::String(format.to_string()));
        }
    }

    #[test]
    fn value_enum_parses_lowercase() {
        assert_eq!(
            OutputFormat::from_str("summary", true).unwrap(),
            OutputFormat::Summary
        );
        assert!(OutputFormat::from_str("toon", true).is_err());
    }

    #[test]
    fn machine_readable_formats() {
        assert!(OutputFormat::Json.is_machine_readable());
        assert!(OutputFormat::Report.is_machine_readable());
        assert!(!OutputFormat::Md.is_machine_readable());
    }
}

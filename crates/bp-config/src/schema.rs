//! Feature schema: which planning inputs feed the regression and how.
//!
//! A schema maps each recognized planning-input key to a dataset column and
//! a coercion rule. Field order is the feature column order of the fit.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// How a raw planning-input value becomes a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Coercion {
    /// Whole number; decimal strings are rejected, JSON floats truncate.
    Integer,
    /// Floating point.
    Float,
}

impl std::fmt::Display for Coercion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Coercion::Integer => write!(f, "integer"),
            Coercion::Float => write!(f, "float"),
        }
    }
}

/// One recognized planning input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FieldSpec {
    /// Key in the planning-input mapping (e.g. `newJoinees`).
    pub input_key: String,

    /// Dataset column it maps to (e.g. `new_joinees`).
    pub column: String,

    pub coercion: Coercion,
}

impl FieldSpec {
    pub fn new(input_key: &str, column: &str, coercion: Coercion) -> Self {
        FieldSpec {
            input_key: input_key.to_string(),
            column: column.to_string(),
            coercion,
        }
    }
}

/// Static qualitative note attached to a feature column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FeatureNote {
    pub column: String,
    pub note: String,
}

/// Fixed result returned when a prediction fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FallbackSpec {
    /// Reported as `nextYear`; independent of the schema's own `next_year`.
    #[serde(default = "default_fallback_year")]
    pub next_year: i32,
    pub allocation: i64,
    pub committed: i64,
    pub spent: i64,
    pub confidence: f64,
}

fn default_fallback_year() -> i32 {
    2024
}

impl Default for FallbackSpec {
    fn default() -> Self {
        FallbackSpec {
            next_year: default_fallback_year(),
            allocation: 480_000_000,
            committed: 465_000_000,
            spent: 450_000_000,
            confidence: 0.75,
        }
    }
}

/// Complete feature schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FeatureSchema {
    pub schema_version: String,

    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Label reported as `nextYear` in results.
    pub next_year: i32,

    /// Year stamped on the query row built from planning inputs.
    pub query_year: i32,

    pub fields: Vec<FieldSpec>,

    /// Emitted verbatim as `feature_importance` when non-empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub feature_notes: Vec<FeatureNote>,

    /// Report the spent model's R² in the `spent_mae` slot.
    #[serde(default)]
    pub spent_mae_reports_r2: bool,

    #[serde(default)]
    pub fallback: FallbackSpec,
}

impl FeatureSchema {
    /// Feature columns in fit order.
    pub fn columns(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.column.as_str()).collect()
    }

    /// Look up a field by its planning-input key.
    pub fn field(&self, input_key: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.input_key == input_key)
    }

    pub fn n_features(&self) -> usize {
        self.fields.len()
    }

    /// Load a schema from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, crate::validate::ValidationError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::validate::ValidationError::IoError(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::from_json(&content)
    }

    /// Parse a schema from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, crate::validate::ValidationError> {
        serde_json::from_str(json).map_err(|e| {
            crate::validate::ValidationError::ParseError(format!("Invalid JSON: {}", e))
        })
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        crate::preset::Variant::default().schema()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_json_fills_defaults() {
        let json = r#"{
            "schema_version": "1.0.0",
            "name": "custom",
            "next_year": 2025,
            "query_year": 2025,
            "fields": [
                {"input_key": "promotions", "column": "promotions", "coercion": "integer"},
                {"input_key": "gratuity", "column": "gratuity", "coercion": "float"}
            ]
        }"#;
        let schema = FeatureSchema::from_json(json).unwrap();
        assert_eq!(schema.columns(), vec!["promotions", "gratuity"]);
        assert!(schema.feature_notes.is_empty());
        assert!(!schema.spent_mae_reports_r2);
        assert_eq!(schema.fallback, FallbackSpec::default());
        assert_eq!(
            schema.field("gratuity").map(|f| f.coercion),
            Some(Coercion::Float)
        );
    }

    #[test]
    fn unknown_coercion_is_rejected() {
        let json = r#"{
            "schema_version": "1.0.0", "name": "x", "next_year": 2024, "query_year": 2024,
            "fields": [{"input_key": "a", "column": "a", "coercion": "decimal"}]
        }"#;
        assert!(FeatureSchema::from_json(json).is_err());
    }

    #[test]
    fn fallback_defaults() {
        let fb = FallbackSpec::default();
        assert_eq!(fb.next_year, 2024);
        assert_eq!(fb.allocation, 480_000_000);
        assert_eq!(fb.committed, 465_000_000);
        assert_eq!(fb.spent, 450_000_000);
        assert_eq!(fb.confidence, 0.75);
    }
}

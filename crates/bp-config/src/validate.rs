//! Configuration validation errors and semantic validation.

use crate::history::HistoricalDataset;
use crate::schema::FeatureSchema;
use std::collections::HashSet;
use thiserror::Error;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Schema validation failed: {0}")]
    SchemaError(String),

    #[error("Semantic validation failed: {0}")]
    SemanticError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 60,
            ValidationError::ParseError(_) => 61,
            ValidationError::SchemaError(_) => 62,
            ValidationError::SemanticError(_) => 63,
            ValidationError::MissingField(_) => 64,
            ValidationError::InvalidValue { .. } => 65,
            ValidationError::VersionMismatch { .. } => 66,
        }
    }
}

fn check_version(actual: &str) -> ValidationResult<()> {
    if actual != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: actual.to_string(),
        });
    }
    Ok(())
}

/// Validate a historical dataset on its own.
pub fn validate_history(history: &HistoricalDataset) -> ValidationResult<()> {
    check_version(&history.schema_version)?;

    if history.records.is_empty() {
        return Err(ValidationError::SemanticError(
            "history must contain at least one record".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for record in &history.records {
        if !seen.insert(record.year) {
            return Err(ValidationError::SemanticError(format!(
                "duplicate record for year {}",
                record.year
            )));
        }

        for (name, value) in [
            ("allocation", record.allocation),
            ("committed", record.committed),
            ("spent", record.spent),
        ] {
            if !value.is_finite() {
                return Err(ValidationError::InvalidValue {
                    field: format!("records.{}.{}", record.year, name),
                    message: format!("Must be finite, got {}", value),
                });
            }
        }

        for (column, value) in &record.features {
            if !value.is_finite() {
                return Err(ValidationError::InvalidValue {
                    field: format!("records.{}.{}", record.year, column),
                    message: format!("Must be finite, got {}", value),
                });
            }
        }
    }

    Ok(())
}

/// Validate a feature schema on its own.
pub fn validate_schema(schema: &FeatureSchema) -> ValidationResult<()> {
    check_version(&schema.schema_version)?;

    if schema.fields.is_empty() {
        return Err(ValidationError::SchemaError(
            "fields must list at least one planning input".to_string(),
        ));
    }

    let mut keys = HashSet::new();
    let mut columns = HashSet::new();
    for field in &schema.fields {
        if field.input_key.trim().is_empty() || field.column.trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "fields".to_string(),
                message: "input_key and column must be non-empty".to_string(),
            });
        }
        if !keys.insert(field.input_key.as_str()) {
            return Err(ValidationError::SemanticError(format!(
                "input key '{}' is listed twice",
                field.input_key
            )));
        }
        if !columns.insert(field.column.as_str()) {
            return Err(ValidationError::SemanticError(format!(
                "column '{}' is mapped twice",
                field.column
            )));
        }
    }

    for note in &schema.feature_notes {
        if !columns.contains(note.column.as_str()) {
            return Err(ValidationError::InvalidValue {
                field: format!("feature_notes.{}", note.column),
                message: "note refers to a column the schema does not use".to_string(),
            });
        }
    }

    let fb = &schema.fallback;
    if fb.allocation < 0 || fb.committed > fb.allocation || fb.spent > fb.committed {
        return Err(ValidationError::InvalidValue {
            field: "fallback".to_string(),
            message: format!(
                "Must satisfy 0 <= allocation and spent <= committed <= allocation, got {}/{}/{}",
                fb.allocation, fb.committed, fb.spent
            ),
        });
    }
    if !(0.0..=1.0).contains(&fb.confidence) {
        return Err(ValidationError::InvalidValue {
            field: "fallback.confidence".to_string(),
            message: format!("Must be in [0, 1], got {}", fb.confidence),
        });
    }

    Ok(())
}

/// Check that every record carries every column the schema reads.
pub fn validate_compatibility(
    schema: &FeatureSchema,
    history: &HistoricalDataset,
) -> ValidationResult<()> {
    for record in &history.records {
        for column in schema.columns() {
            if record.feature(column).is_none() {
                return Err(ValidationError::MissingField(format!(
                    "record {} has no column '{}' required by schema '{}'",
                    record.year, column, schema.name
                )));
            }
        }
    }
    Ok(())
}

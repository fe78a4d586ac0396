//! Built-in feature schemas.
//!
//! Two variants of the budget model exist:
//! - Original: staffing counts plus January/July increments and pay level
//! - Updated: drops the July increment and pay level, adds new-joinee basic pay

use crate::schema::{Coercion, FallbackSpec, FeatureNote, FeatureSchema, FieldSpec};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Available built-in variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Eight features including incrementJuly and payLevel
    Original,
    /// Seven features including newJoineeBasicPay
    #[default]
    Updated,
}

impl Variant {
    /// All available variants.
    pub const ALL: &'static [Variant] = &[Variant::Original, Variant::Updated];

    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Original => "original",
            Variant::Updated => "updated",
        }
    }

    /// Parse variant name from string.
    pub fn parse(s: &str) -> Option<Variant> {
        match s.to_lowercase().as_str() {
            "original" | "v1" | "legacy" => Some(Variant::Original),
            "updated" | "v2" => Some(Variant::Updated),
            _ => None,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Variant::Original => {
                "Promotions, retirements, new joinees, Jan/Jul increments, basic pay difference, gratuity, pay level"
            }
            Variant::Updated => {
                "Promotions, retirements, new joinees and their basic pay, Jan increment, basic pay difference, gratuity"
            }
        }
    }

    /// Build the feature schema for this variant.
    pub fn schema(&self) -> FeatureSchema {
        match self {
            Variant::Original => original_schema(),
            Variant::Updated => updated_schema(),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Variant {
    type Err = VariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Variant::parse(s).ok_or_else(|| VariantError::UnknownVariant(s.to_string()))
    }
}

/// Errors related to variant lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariantError {
    UnknownVariant(String),
}

impl fmt::Display for VariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariantError::UnknownVariant(name) => {
                write!(
                    f,
                    "Unknown variant '{}'. Available: {}",
                    name,
                    Variant::ALL
                        .iter()
                        .map(|v| v.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            }
        }
    }
}

impl std::error::Error for VariantError {}

/// Original feature set.
///
/// The query row is stamped 2023 while results report `nextYear` 2024.
fn original_schema() -> FeatureSchema {
    FeatureSchema {
        schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
        name: Variant::Original.as_str().to_string(),
        description: Some(Variant::Original.description().to_string()),
        next_year: 2024,
        query_year: 2023,
        fields: vec![
            FieldSpec::new("promotions", "promotions", Coercion::Integer),
            FieldSpec::new("retirements", "retirements", Coercion::Integer),
            FieldSpec::new("newJoinees", "new_joinees", Coercion::Integer),
            FieldSpec::new("incrementJanuary", "increment_jan", Coercion::Float),
            FieldSpec::new("incrementJuly", "increment_jul", Coercion::Float),
            FieldSpec::new("basicPayDifference", "basic_pay_diff", Coercion::Float),
            FieldSpec::new("gratuity", "gratuity", Coercion::Float),
            FieldSpec::new("payLevel", "pay_level", Coercion::Float),
        ],
        feature_notes: Vec::new(),
        spent_mae_reports_r2: false,
        fallback: FallbackSpec::default(),
    }
}

/// Updated feature set with static per-feature notes.
fn updated_schema() -> FeatureSchema {
    let notes = [
        ("promotions", "High impact on allocation increase"),
        ("new_joinees", "Direct correlation with budget growth"),
        ("new_joinee_basic_pay", "Major factor in total allocation"),
        ("retirements", "Reduces ongoing costs"),
        ("increment_jan", "Affects all staff costs"),
        ("basic_pay_diff", "Overall salary adjustment impact"),
        ("gratuity", "One-time significant expense"),
    ];

    FeatureSchema {
        schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
        name: Variant::Updated.as_str().to_string(),
        description: Some(Variant::Updated.description().to_string()),
        next_year: 2024,
        query_year: 2024,
        fields: vec![
            FieldSpec::new("promotions", "promotions", Coercion::Integer),
            FieldSpec::new("retirements", "retirements", Coercion::Integer),
            FieldSpec::new("newJoinees", "new_joinees", Coercion::Integer),
            FieldSpec::new("newJoineeBasicPay", "new_joinee_basic_pay", Coercion::Float),
            FieldSpec::new("incrementJanuary", "increment_jan", Coercion::Float),
            FieldSpec::new("basicPayDifference", "basic_pay_diff", Coercion::Float),
            FieldSpec::new("gratuity", "gratuity", Coercion::Float),
        ],
        feature_notes: notes
            .iter()
            .map(|(column, note)| FeatureNote {
                column: column.to_string(),
                note: note.to_string(),
            })
            .collect(),
        spent_mae_reports_r2: true,
        fallback: FallbackSpec::default(),
    }
}

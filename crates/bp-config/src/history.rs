//! Historical budget records used as the regression training set.
//!
//! These types match the history.json layout: each record is a flat object
//! with identifying fields, the three target amounts, and any number of
//! numeric feature columns.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Budget figure being predicted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    Allocation,
    Committed,
    Spent,
}

impl Target {
    /// All targets in reporting order.
    pub const ALL: [Target; 3] = [Target::Allocation, Target::Committed, Target::Spent];

    pub fn as_str(&self) -> &'static str {
        match self {
            Target::Allocation => "allocation",
            Target::Committed => "committed",
            Target::Spent => "spent",
        }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One past year of a budget line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct HistoricalRecord {
    pub year: i32,

    /// Major budget head.
    pub budg_mj_head: String,

    /// Minor budget head.
    pub budg_mi_head: String,

    /// Programme code.
    pub budg_prog_cd: String,

    pub allocation: f64,
    pub committed: f64,
    pub spent: f64,

    /// Numeric feature columns keyed by column name.
    #[serde(flatten)]
    pub features: BTreeMap<String, f64>,
}

impl HistoricalRecord {
    /// Value of a target amount.
    pub fn target(&self, target: Target) -> f64 {
        match target {
            Target::Allocation => self.allocation,
            Target::Committed => self.committed,
            Target::Spent => self.spent,
        }
    }

    /// Value of a feature column, if the record carries it.
    pub fn feature(&self, column: &str) -> Option<f64> {
        self.features.get(column).copied()
    }
}

/// The full training table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct HistoricalDataset {
    pub schema_version: String,

    #[serde(default)]
    pub description: Option<String>,

    pub records: Vec<HistoricalRecord>,
}

impl HistoricalDataset {
    /// Built-in three-year fixture for head R1 / R101 / OSTF.
    ///
    /// Carries the union of columns used by every built-in variant so the
    /// same table serves both feature sets.
    pub fn builtin() -> Self {
        HistoricalDataset {
            schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
            description: Some("Grant financials 2020-2022, head R1/R101/OSTF".to_string()),
            records: vec![
                builtin_record(
                    2020,
                    [384_249_300.0, 378_226_271.0, 334_783_061.0],
                    [15.0, 8.0, 12.0, 9_600_000.0, 3.0, 2.5, 2_500_000.0, 1_200_000.0, 7.5],
                ),
                builtin_record(
                    2021,
                    [425_000_000.0, 421_447_443.0, 419_826_349.0],
                    [18.0, 6.0, 15.0, 12_000_000.0, 3.5, 3.0, 3_200_000.0, 900_000.0, 8.0],
                ),
                builtin_record(
                    2022,
                    [450_000_000.0, 434_344_498.0, 434_047_435.0],
                    [20.0, 10.0, 18.0, 14_400_000.0, 4.0, 3.5, 3_800_000.0, 1_500_000.0, 8.5],
                ),
            ],
        }
    }

    /// Load a dataset from a JSON file.
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

    /// Parse a dataset from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, crate::validate::ValidationError> {
        serde_json::from_str(json).map_err(|e| {
            crate::validate::ValidationError::ParseError(format!("Invalid JSON: {}", e))
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Most recent record by year.
    pub fn latest(&self) -> Option<&HistoricalRecord> {
        self.records.iter().max_by_key(|r| r.year)
    }

    pub fn years(&self) -> Vec<i32> {
        self.records.iter().map(|r| r.year).collect()
    }
}

impl Default for HistoricalDataset {
    fn default() -> Self {
        Self::builtin()
    }
}

const BUILTIN_COLUMNS: [&str; 9] = [
    "promotions",
    "retirements",
    "new_joinees",
    "new_joinee_basic_pay",
    "increment_jan",
    "increment_jul",
    "basic_pay_diff",
    "gratuity",
    "pay_level",
];

fn builtin_record(year: i32, targets: [f64; 3], features: [f64; 9]) -> HistoricalRecord {
    let [allocation, committed, spent] = targets;
    HistoricalRecord {
        year,
        budg_mj_head: "R1".to_string(),
        budg_mi_head: "R101".to_string(),
        budg_prog_cd: "OSTF".to_string(),
        allocation,
        committed,
        spent,
        features: BUILTIN_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .zip(features)
            .collect(),
    }
}

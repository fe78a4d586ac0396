//! JSON Schema generation for output and configuration types.
//!
//! ```bash
//! # List available schema types
//! bp-core schema --list
//!
//! # Generate schema for a specific type
//! bp-core schema PredictionOutcome
//! ```

use schemars::schema_for;
use serde_json::Value;
use std::collections::BTreeMap;

pub use crate::history::{HistorySummary, YearSummary};
pub use crate::output::{BudgetReport, ReportAmounts};
pub use crate::result::{
    FallbackResult, ImpactFactors, ModelInfo, ModelPerformance, PredictionOutcome,
    PredictionResult,
};
pub use bp_config::{FeatureSchema, HistoricalDataset, HistoricalRecord};

/// Available schema types with their descriptions.
pub fn available_schemas() -> Vec<(&'static str, &'static str)> {
    vec![
        // Prediction payloads
        ("PredictionOutcome", "Computed result or fallback, as printed by predict"),
        ("PredictionResult", "Computed prediction"),
        ("FallbackResult", "Fixed result returned when prediction fails"),
        ("ModelPerformance", "In-sample R² and MAE per target"),
        ("ModelInfo", "Trend model parameters"),
        ("ImpactFactors", "Per-input contributions of the trend model"),
        ("BudgetReport", "Export report with INR-formatted amounts"),
        // History
        ("HistorySummary", "Year-by-year utilization, commitment and growth"),
        ("YearSummary", "One year of the history summary"),
        // Configuration files
        ("HistoricalDataset", "history.json"),
        ("HistoricalRecord", "One record of history.json"),
        ("FeatureSchema", "schema.json"),
    ]
}

/// Generate JSON Schema for a type by name.
///
/// Returns None if the type is unknown.
pub fn generate_schema(type_name: &str) -> Option<Value> {
    let schema = match type_name {
        "PredictionOutcome" => schema_for!(PredictionOutcome),
        "PredictionResult" => schema_for!(PredictionResult),
        "FallbackResult" => schema_for!(FallbackResult),
        "ModelPerformance" => schema_for!(ModelPerformance),
        "ModelInfo" => schema_for!(ModelInfo),
        "ImpactFactors" => schema_for!(ImpactFactors),
        "BudgetReport" => schema_for!(BudgetReport),
        "HistorySummary" => schema_for!(HistorySummary),
        "YearSummary" => schema_for!(YearSummary),
        "HistoricalDataset" => schema_for!(HistoricalDataset),
        "HistoricalRecord" => schema_for!(HistoricalRecord),
        "FeatureSchema" => schema_for!(FeatureSchema),
        _ => return None,
    };

    Some(Value::from(schema))
}

/// Generate all schemas as a map from type name to schema.
pub fn generate_all_schemas() -> BTreeMap<String, Value> {
    available_schemas()
        .into_iter()
        .filter_map(|(name, _)| generate_schema(name).map(|s| (name.to_string(), s)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_type_generates() {
        for (name, _) in available_schemas() {
            let schema = generate_schema(name).unwrap_or_else(|| panic!("no schema for {}", name));
            assert!(schema.is_object(), "{}", name);
        }
        assert_eq!(generate_all_schemas().len(), available_schemas().len());
    }

    #[test]
    fn unknown_type_is_none() {
        assert!(generate_schema("Plan").is_none());
    }

    #[test]
    fn prediction_result_uses_wire_names() {
        let schema = generate_schema("PredictionResult").unwrap();
        let props = &schema["properties"];
        assert!(props.get("nextYear").is_some());
        assert!(props.get("modelInfo").is_some());
        assert!(props.get("next_year").is_none());
    }

    #[test]
    fn report_has_generated_on() {
        let schema = generate_schema("BudgetReport").unwrap();
        assert!(schema["properties"].get("generatedOn").is_some());
    }
}

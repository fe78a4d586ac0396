//! Fuzz target for schema.json parsing.
//!
//! A schema that validates must never make prediction panic, whatever
//! columns it names.

#![no_main]

use bp_config::validate::validate_schema;
use bp_config::{FeatureSchema, HistoricalDataset};
use bp_core::input::PlanningInputs;
use bp_core::BudgetPredictor;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(schema) = serde_json::from_slice::<FeatureSchema>(data) else {
        return;
    };
    if validate_schema(&schema).is_ok() {
        let predictor = BudgetPredictor::new(schema, HistoricalDataset::builtin());
        let _ = predictor.predict(&PlanningInputs::new());
    }
});

//! Budget Planner Core Library
//!
//! Next-year budget prediction for a single budget line:
//! - Per-target OLS regression over historical records
//! - Rule-based trend estimate
//! - Historical utilization summary
//! - Configuration loading, output rendering and logging
//!
//! The binary entry point is in `main.rs`.

pub mod config;
pub mod exit_codes;
pub mod history;
pub mod input;
pub mod logging;
pub mod output;
pub mod predictor;
pub mod result;
pub mod schema;
pub mod trend;

pub use history::HistorySummary;
pub use input::PlanningInputs;
pub use predictor::{BudgetPredictor, PredictionError};
pub use result::{FallbackResult, PredictionOutcome, PredictionResult};
pub use trend::TrendEstimator;

use bp_config::Variant;

/// Predict next-year figures with the default schema and built-in history.
///
/// Never fails: on any error the fallback result is returned.
pub fn predict(inputs: &PlanningInputs) -> PredictionOutcome {
    BudgetPredictor::builtin(Variant::default()).predict(inputs)
}

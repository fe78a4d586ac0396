//! Prediction result payloads.
//!
//! Field names follow the JSON contract consumed by the planning front end
//! (`nextYear`, `model_performance`, `feature_importance`, `modelInfo`), so
//! serde renames are load-bearing here.

use crate::input::PlanningInputs;
use bp_config::FeatureSchema;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// In-sample diagnostics for the three fitted models.
///
/// `spent_mae` carries the spent R² when the schema sets
/// `spent_mae_reports_r2`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ModelPerformance {
    pub allocation_r2: f64,
    pub committed_r2: f64,
    pub spent_r2: f64,
    pub allocation_mae: f64,
    pub committed_mae: f64,
    pub spent_mae: f64,
}

/// Per-input contributions reported by the trend model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImpactFactors {
    pub promotions: f64,
    pub new_joinees: f64,
    pub new_joinee_basic_pay: f64,
    pub retirements: f64,
    pub gratuity: f64,
    pub increments: f64,
    pub basic_pay: f64,
}

/// Trend model parameters echoed with its result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub base_growth_rate: f64,
    pub impact_factors: ImpactFactors,
}

/// A computed prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PredictionResult {
    #[serde(rename = "nextYear")]
    pub next_year: i32,

    pub allocation: i64,
    pub committed: i64,
    pub spent: i64,

    /// Heuristic in [0.70, 0.95]; not a statistical interval.
    pub confidence: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_performance: Option<ModelPerformance>,

    /// Planning inputs exactly as submitted.
    pub factors: PlanningInputs,

    /// Static per-column notes, keyed by column name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_importance: Option<Map<String, Value>>,

    #[serde(
        rename = "modelInfo",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub model_info: Option<ModelInfo>,
}

/// Fixed result returned when prediction fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FallbackResult {
    #[serde(rename = "nextYear")]
    pub next_year: i32,

    pub allocation: i64,
    pub committed: i64,
    pub spent: i64,
    pub confidence: f64,
    pub factors: PlanningInputs,

    /// Why the computed path failed.
    pub error: String,
}

impl FallbackResult {
    /// Build the schema's fallback for `inputs`.
    pub fn new(schema: &FeatureSchema, inputs: &PlanningInputs, error: String) -> Self {
        let fb = &schema.fallback;
        FallbackResult {
            next_year: fb.next_year,
            allocation: fb.allocation,
            committed: fb.committed,
            spent: fb.spent,
            confidence: fb.confidence,
            factors: inputs.clone(),
            error,
        }
    }
}

/// Either a computed result or the fallback. Serializes without a tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum PredictionOutcome {
    // Listed first so untagged deserialization only picks it when `error` is present.
    Fallback(FallbackResult),
    Computed(PredictionResult),
}

impl PredictionOutcome {
    pub fn is_fallback(&self) -> bool {
        matches!(self, PredictionOutcome::Fallback(_))
    }

    pub fn next_year(&self) -> i32 {
        match self {
            PredictionOutcome::Computed(r) => r.next_year,
            PredictionOutcome::Fallback(f) => f.next_year,
        }
    }

    /// `(allocation, committed, spent)`.
    pub fn amounts(&self) -> (i64, i64, i64) {
        match self {
            PredictionOutcome::Computed(r) => (r.allocation, r.committed, r.spent),
            PredictionOutcome::Fallback(f) => (f.allocation, f.committed, f.spent),
        }
    }

    pub fn confidence(&self) -> f64 {
        match self {
            PredictionOutcome::Computed(r) => r.confidence,
            PredictionOutcome::Fallback(f) => f.confidence,
        }
    }

    pub fn factors(&self) -> &PlanningInputs {
        match self {
            PredictionOutcome::Computed(r) => &r.factors,
            PredictionOutcome::Fallback(f) => &f.factors,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            PredictionOutcome::Computed(_) => None,
            PredictionOutcome::Fallback(f) => Some(&f.error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn computed() -> PredictionResult {
        PredictionResult {
            next_year: 2024,
            allocation: 3,
            committed: 2,
            spent: 1,
            confidence: 0.95,
            model_performance: None,
            factors: PlanningInputs::new(),
            feature_importance: None,
            model_info: None,
        }
    }

    #[test]
    fn computed_omits_absent_sections() {
        let json = serde_json::to_value(PredictionOutcome::Computed(computed())).unwrap();
        assert_eq!(json["nextYear"], 2024);
        assert!(json.get("model_performance").is_none());
        assert!(json.get("feature_importance").is_none());
        assert!(json.get("modelInfo").is_none());
        assert!(json.get("error").is_none());
    }

    #[test]
    fn key_order_follows_contract() {
        let mut result = computed();
        result.model_performance = Some(ModelPerformance {
            allocation_r2: 1.0,
            committed_r2: 1.0,
            spent_r2: 1.0,
            allocation_mae: 0.0,
            committed_mae: 0.0,
            spent_mae: 0.0,
        });
        let text = serde_json::to_string(&result).unwrap();
        let keys = [
            "nextYear",
            "allocation",
            "committed",
            "spent",
            "confidence",
            "model_performance",
            "factors",
        ];
        let positions: Vec<_> = keys.iter().map(|k| text.find(&format!("\"{}\"", k)).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{}", text);
        let mp = text.find("allocation_r2").unwrap();
        assert!(mp < text.find("spent_r2").unwrap());
        assert!(text.find("spent_r2").unwrap() < text.find("allocation_mae").unwrap());
    }

    #[test]
    fn untagged_round_trip_picks_variant() {
        let schema = bp_config::Variant::Updated.schema();
        let mut inputs = PlanningInputs::new();
        inputs.insert("promotions".into(), json!("abc"));
        let fallback = PredictionOutcome::Fallback(FallbackResult::new(&schema, &inputs, "boom".into()));
        let text = serde_json::to_string(&fallback).unwrap();
        let back: PredictionOutcome = serde_json::from_str(&text).unwrap();
        assert!(back.is_fallback());
        assert_eq!(back.amounts(), (480_000_000, 465_000_000, 450_000_000));

        let text = serde_json::to_string(&PredictionOutcome::Computed(computed())).unwrap();
        let back: PredictionOutcome = serde_json::from_str(&text).unwrap();
        assert!(!back.is_fallback());
        assert_eq!(back.error(), None);
    }

    #[test]
    fn fallback_year_ignores_schema_next_year() {
        let mut schema = bp_config::Variant::Updated.schema();
        schema.next_year = 2031;
        let fallback = FallbackResult::new(&schema, &PlanningInputs::new(), "boom".into());
        assert_eq!(fallback.next_year, 2024);
    }

    #[test]
    fn impact_factor_names_are_camel_case() {
        let info = ModelInfo {
            base_growth_rate: 0.082,
            impact_factors: ImpactFactors {
                promotions: 0.0,
                new_joinees: 0.0,
                new_joinee_basic_pay: 0.0,
                retirements: 0.0,
                gratuity: 0.0,
                increments: 0.0,
                basic_pay: 0.0,
            },
        };
        let json = serde_json::to_value(info).unwrap();
        assert_eq!(json["baseGrowthRate"], 0.082);
        assert!(json["impactFactors"].get("newJoineeBasicPay").is_some());
        assert!(json["impactFactors"].get("basicPay").is_some());
    }
}

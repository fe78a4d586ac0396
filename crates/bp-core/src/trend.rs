//! Rule-based trend estimator.
//!
//! Grows the latest allocation by a fixed rate and adds a fixed impact per
//! planning input. Committed and spent follow historical average ratios.
//! No fitting is involved, so the confidence is a constant.
//!
//! Inputs are read leniently: the numeric prefix of each value counts and
//! anything unparseable is zero, so bad input never forces the fallback.

use crate::input::{lenient_field_value, PlanningInputs};
use crate::logging::{event_names, Stage};
use crate::predictor::{enforce_consistency, PredictionError};
use crate::result::{FallbackResult, ImpactFactors, ModelInfo, PredictionOutcome, PredictionResult};
use bp_config::{Coercion, FeatureSchema, HistoricalDataset, Target};

/// Average year-over-year allocation growth.
pub const BASE_GROWTH_RATE: f64 = 0.082;

/// Average committed / allocation ratio.
pub const COMMITMENT_RATIO: f64 = 0.968;

/// Average spent / allocation ratio.
pub const UTILIZATION_RATIO: f64 = 0.924;

/// Reported confidence for every trend estimate.
pub const TREND_CONFIDENCE: f64 = 0.90;

pub const PROMOTION_IMPACT: f64 = 500_000.0;
pub const NEW_JOINEE_IMPACT: f64 = 800_000.0;
pub const RETIREMENT_IMPACT: f64 = -300_000.0;
pub const INCREMENT_IMPACT: f64 = 1_500_000.0;

/// Trend estimator over a historical dataset.
#[derive(Debug, Clone)]
pub struct TrendEstimator {
    schema: FeatureSchema,
    history: HistoricalDataset,
}

impl TrendEstimator {
    /// The schema supplies `next_year` and the fallback figures; its feature
    /// list is not used.
    pub fn new(schema: FeatureSchema, history: HistoricalDataset) -> Self {
        TrendEstimator { schema, history }
    }

    /// Estimate next-year figures, falling back on any failure.
    pub fn estimate(&self, inputs: &PlanningInputs) -> PredictionOutcome {
        match self.try_estimate(inputs) {
            Ok(result) => PredictionOutcome::Computed(result),
            Err(err) => {
                tracing::error!(
                    target: event_names::PREDICT_FALLBACK,
                    stage = %Stage::Predict,
                    model = "trend",
                    "Error in prediction: {}",
                    err
                );
                PredictionOutcome::Fallback(FallbackResult::new(
                    &self.schema,
                    inputs,
                    err.to_string(),
                ))
            }
        }
    }

    pub fn try_estimate(&self, inputs: &PlanningInputs) -> Result<PredictionResult, PredictionError> {
        let latest = self
            .history
            .latest()
            .ok_or(PredictionError::InsufficientHistory {
                required: 1,
                found: 0,
            })?;

        let int = |key| lenient_field_value(inputs, key, Coercion::Integer);
        let float = |key| lenient_field_value(inputs, key, Coercion::Float);

        let impacts = ImpactFactors {
            promotions: int("promotions") * PROMOTION_IMPACT,
            new_joinees: int("newJoinees") * NEW_JOINEE_IMPACT,
            new_joinee_basic_pay: float("newJoineeBasicPay"),
            retirements: int("retirements") * RETIREMENT_IMPACT,
            gratuity: float("gratuity"),
            increments: float("incrementJanuary") * INCREMENT_IMPACT,
            basic_pay: float("basicPayDifference"),
        };

        let base = latest.allocation * (1.0 + BASE_GROWTH_RATE);
        let allocation = base
            + impacts.promotions
            + impacts.new_joinees
            + impacts.new_joinee_basic_pay
            + impacts.retirements
            + impacts.gratuity
            + impacts.increments
            + impacts.basic_pay;

        // Ratios apply to the clamped allocation so a negative estimate
        // cannot leak into committed or spent.
        let allocation = allocation.max(0.0);
        let (allocation, committed, spent) = enforce_consistency(
            allocation,
            allocation * COMMITMENT_RATIO,
            allocation * UTILIZATION_RATIO,
        );

        tracing::info!(
            target: event_names::PREDICT_FINISHED,
            stage = %Stage::Predict,
            model = "trend",
            base_year = latest.year,
            allocation,
            "trend estimate complete"
        );

        Ok(PredictionResult {
            next_year: self.schema.next_year,
            allocation: round_amount(Target::Allocation, allocation)?,
            committed: round_amount(Target::Committed, committed)?,
            spent: round_amount(Target::Spent, spent)?,
            confidence: TREND_CONFIDENCE,
            model_performance: None,
            factors: inputs.clone(),
            feature_importance: None,
            model_info: Some(ModelInfo {
                base_growth_rate: BASE_GROWTH_RATE,
                impact_factors: impacts,
            }),
        })
    }
}

/// Round half away from zero into an `i64` amount.
fn round_amount(target: Target, value: f64) -> Result<i64, PredictionError> {
    crate::predictor::to_amount(target, value.round())
}

//! Per-target regression predictor.
//!
//! For each of allocation, committed and spent, a standard scaler and an
//! OLS model are fitted on the historical rows only, then the planning-input
//! row is scored. Results are clamped so that
//! `0 <= allocation`, `committed <= allocation` and `spent <= committed`.
//!
//! `predict` never fails: any [`PredictionError`] is logged and replaced by
//! the schema's fallback figures.

use crate::input::{query_features, CoercionError, PlanningInputs};
use crate::logging::{event_names, Stage};
use crate::result::{FallbackResult, ModelPerformance, PredictionOutcome, PredictionResult};
use bp_config::{FeatureSchema, HistoricalDataset, HistoricalRecord, Target, Variant};
use bp_math::{mean_absolute_error, r2_score, FitError, LinearModel, StandardScaler};
use serde_json::{Map, Value};
use thiserror::Error;

/// Lower bound of the reported confidence.
pub const CONFIDENCE_FLOOR: f64 = 0.70;

/// Upper bound of the reported confidence.
pub const CONFIDENCE_CEILING: f64 = 0.95;

/// Fewest historical records a fit accepts.
pub const MIN_HISTORY: usize = 2;

/// Everything that sends a prediction to the fallback.
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("invalid planning input: {0}")]
    Input(#[from] CoercionError),

    #[error("historical dataset needs at least {required} records, found {found}")]
    InsufficientHistory { required: usize, found: usize },

    #[error("historical record {year} has no column '{column}'")]
    MissingColumn { year: i32, column: String },

    #[error("{target} model fit failed: {source}")]
    Fit {
        target: Target,
        #[source]
        source: FitError,
    },

    #[error("{target} prediction is not finite ({value})")]
    NonFinite { target: Target, value: f64 },

    #[error("{target} prediction {value} does not fit in a 64-bit integer")]
    OutOfRange { target: Target, value: f64 },
}

/// One fitted target model with its in-sample diagnostics.
#[derive(Debug, Clone)]
pub struct TargetFit {
    pub target: Target,
    pub mae: f64,
    pub r2: f64,
    scaler: StandardScaler,
    model: LinearModel,
}

impl TargetFit {
    /// Fit scaler and model for `target` on `rows`.
    pub fn fit(target: Target, rows: &[Vec<f64>], y: &[f64]) -> Result<Self, PredictionError> {
        let fit_err = |source| PredictionError::Fit { target, source };

        let scaler = StandardScaler::fit(rows).map_err(fit_err)?;
        let scaled = scaler.transform(rows);
        let model = LinearModel::fit(&scaled, y).map_err(fit_err)?;

        let fitted = model.predict(&scaled);
        let mae = mean_absolute_error(y, &fitted);
        let r2 = r2_score(y, &fitted);

        tracing::debug!(
            target: event_names::TRAIN_TARGET_FITTED,
            stage = %Stage::Train,
            model = %target,
            r2,
            mae,
            "fitted {} model",
            target
        );

        Ok(TargetFit {
            target,
            mae,
            r2,
            scaler,
            model,
        })
    }

    /// Score one raw (unscaled) feature row.
    pub fn predict_one(&self, row: &[f64]) -> f64 {
        self.model.predict_row(&self.scaler.transform_row(row))
    }
}

/// Mean R² clamped to `[CONFIDENCE_FLOOR, CONFIDENCE_CEILING]`.
///
/// NaN maps to the floor.
pub fn confidence_from_r2(r2: &[f64]) -> f64 {
    if r2.is_empty() {
        return CONFIDENCE_FLOOR;
    }
    let mean = r2.iter().sum::<f64>() / r2.len() as f64;
    if mean.is_nan() {
        CONFIDENCE_FLOOR
    } else {
        mean.clamp(CONFIDENCE_FLOOR, CONFIDENCE_CEILING)
    }
}

/// Force `0 <= allocation`, `committed <= allocation`, `spent <= committed`.
///
/// Applied once, in that order.
pub fn enforce_consistency(allocation: f64, committed: f64, spent: f64) -> (f64, f64, f64) {
    let allocation = allocation.max(0.0);
    let committed = committed.min(allocation);
    let spent = spent.min(committed);
    (allocation, committed, spent)
}

/// Truncate toward zero into an `i64` amount.
pub(crate) fn to_amount(target: Target, value: f64) -> Result<i64, PredictionError> {
    if !value.is_finite() {
        return Err(PredictionError::NonFinite { target, value });
    }
    let t = value.trunc();
    // i64::MAX as f64 rounds up to 2^63, which is already out of range.
    if t < i64::MIN as f64 || t >= i64::MAX as f64 {
        return Err(PredictionError::OutOfRange { target, value });
    }
    Ok(t as i64)
}

/// Schema-driven budget predictor.
///
/// Holds only immutable configuration; every call fits fresh models.
#[derive(Debug, Clone)]
pub struct BudgetPredictor {
    schema: FeatureSchema,
    history: HistoricalDataset,
}

impl BudgetPredictor {
    pub fn new(schema: FeatureSchema, history: HistoricalDataset) -> Self {
        BudgetPredictor { schema, history }
    }

    /// Built-in variant schema over the built-in history.
    pub fn builtin(variant: Variant) -> Self {
        Self::new(variant.schema(), HistoricalDataset::builtin())
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn history(&self) -> &HistoricalDataset {
        &self.history
    }

    /// Predict next-year figures, falling back on any failure.
    pub fn predict(&self, inputs: &PlanningInputs) -> PredictionOutcome {
        match self.try_predict(inputs) {
            Ok(result) => PredictionOutcome::Computed(result),
            Err(err) => {
                tracing::error!(
                    target: event_names::PREDICT_FALLBACK,
                    stage = %Stage::Predict,
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

    /// Predict next-year figures, surfacing the failure instead of falling
    /// back.
    pub fn try_predict(&self, inputs: &PlanningInputs) -> Result<PredictionResult, PredictionError> {
        tracing::info!(
            target: event_names::PREDICT_STARTED,
            stage = %Stage::Predict,
            schema = %self.schema.name,
            records = self.history.len() as u64,
            "predicting {}",
            self.schema.next_year
        );

        let query = self.query_record(query_features(&self.schema, inputs)?);
        let (rows, targets) = self.training_data()?;
        let query_row = self.feature_row(&query)?;

        let fits = Target::ALL
            .iter()
            .zip(&targets)
            .map(|(&target, y)| TargetFit::fit(target, &rows, y))
            .collect::<Result<Vec<_>, _>>()?;

        let [alloc_fit, commit_fit, spent_fit] = [&fits[0], &fits[1], &fits[2]];
        let raw = [
            alloc_fit.predict_one(&query_row),
            commit_fit.predict_one(&query_row),
            spent_fit.predict_one(&query_row),
        ];
        for (&target, &value) in Target::ALL.iter().zip(&raw) {
            if !value.is_finite() {
                return Err(PredictionError::NonFinite { target, value });
            }
        }

        let (allocation, committed, spent) = enforce_consistency(raw[0], raw[1], raw[2]);
        if (allocation, committed, spent) != (raw[0], raw[1], raw[2]) {
            tracing::debug!(
                target: event_names::PREDICT_CLAMPED,
                stage = %Stage::Predict,
                raw_allocation = raw[0],
                raw_committed = raw[1],
                raw_spent = raw[2],
                "clamped predictions to keep spent <= committed <= allocation"
            );
        }

        let confidence = confidence_from_r2(&[alloc_fit.r2, commit_fit.r2, spent_fit.r2]);

        let result = PredictionResult {
            next_year: self.schema.next_year,
            allocation: to_amount(Target::Allocation, allocation)?,
            committed: to_amount(Target::Committed, committed)?,
            spent: to_amount(Target::Spent, spent)?,
            confidence,
            model_performance: Some(ModelPerformance {
                allocation_r2: alloc_fit.r2,
                committed_r2: commit_fit.r2,
                spent_r2: spent_fit.r2,
                allocation_mae: alloc_fit.mae,
                committed_mae: commit_fit.mae,
                spent_mae: if self.schema.spent_mae_reports_r2 {
                    spent_fit.r2
                } else {
                    spent_fit.mae
                },
            }),
            factors: inputs.clone(),
            feature_importance: self.feature_notes(),
            model_info: None,
        };

        tracing::info!(
            target: event_names::PREDICT_FINISHED,
            stage = %Stage::Predict,
            allocation = result.allocation,
            committed = result.committed,
            spent = result.spent,
            confidence,
            "prediction complete"
        );

        Ok(result)
    }

    /// Historical feature rows and per-target vectors, in `Target::ALL` order.
    fn training_data(&self) -> Result<(Vec<Vec<f64>>, [Vec<f64>; 3]), PredictionError> {
        if self.history.len() < MIN_HISTORY {
            return Err(PredictionError::InsufficientHistory {
                required: MIN_HISTORY,
                found: self.history.len(),
            });
        }

        let rows = self
            .history
            .records
            .iter()
            .map(|record| self.feature_row(record))
            .collect::<Result<Vec<_>, _>>()?;
        let targets = Target::ALL.map(|t| self.history.records.iter().map(|r| r.target(t)).collect());

        Ok((rows, targets))
    }

    fn feature_row(&self, record: &HistoricalRecord) -> Result<Vec<f64>, PredictionError> {
        self.schema
            .columns()
            .into_iter()
            .map(|column| {
                record
                    .feature(column)
                    .ok_or_else(|| PredictionError::MissingColumn {
                        year: record.year,
                        column: column.to_string(),
                    })
            })
            .collect()
    }

    /// Planning-input row: zero targets, `query_year`, heads of the latest record.
    fn query_record(&self, features: Vec<f64>) -> HistoricalRecord {
        let heads = self.history.latest();
        let head = |f: fn(&HistoricalRecord) -> &String| heads.map(f).cloned().unwrap_or_default();

        HistoricalRecord {
            year: self.schema.query_year,
            budg_mj_head: head(|r| &r.budg_mj_head),
            budg_mi_head: head(|r| &r.budg_mi_head),
            budg_prog_cd: head(|r| &r.budg_prog_cd),
            allocation: 0.0,
            committed: 0.0,
            spent: 0.0,
            features: self
                .schema
                .columns()
                .into_iter()
                .map(String::from)
                .zip(features)
                .collect(),
        }
    }

    fn feature_notes(&self) -> Option<Map<String, Value>> {
        if self.schema.feature_notes.is_empty() {
            return None;
        }
        Some(
            self.schema
                .feature_notes
                .iter()
                .map(|n| (n.column.clone(), Value::String(n.note.clone())))
                .collect(),
        )
    }
}

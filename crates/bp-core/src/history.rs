//! Year-by-year summary of the historical dataset.
//!
//! Percentages are `None` where their denominator is zero. Averages cover
//! historical years only; a prediction appended with
//! [`HistorySummary::with_prediction`] does not move them.

use crate::result::PredictionOutcome;
use bp_config::HistoricalDataset;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One row of the summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct YearSummary {
    pub year: i32,
    pub allocation: f64,
    pub committed: f64,
    pub spent: f64,

    /// spent / allocation × 100.
    pub utilization_pct: Option<f64>,

    /// committed / allocation × 100.
    pub commitment_pct: Option<f64>,

    /// Allocation change against the previous row.
    pub growth_pct: Option<f64>,

    #[serde(default)]
    pub is_prediction: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct HistorySummary {
    pub years: Vec<YearSummary>,
    pub average_utilization_pct: Option<f64>,
    pub average_commitment_pct: Option<f64>,
    pub average_growth_pct: Option<f64>,
}

fn pct(part: f64, whole: f64) -> Option<f64> {
    if whole == 0.0 {
        None
    } else {
        Some(part / whole * 100.0)
    }
}

fn growth(current: f64, previous: Option<f64>) -> Option<f64> {
    previous.and_then(|prev| pct(current - prev, prev))
}

fn mean(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    let present: Vec<f64> = values.flatten().collect();
    if present.is_empty() {
        None
    } else {
        Some(present.iter().sum::<f64>() / present.len() as f64)
    }
}

impl YearSummary {
    fn new(year: i32, allocation: f64, committed: f64, spent: f64, previous: Option<f64>) -> Self {
        YearSummary {
            year,
            allocation,
            committed,
            spent,
            utilization_pct: pct(spent, allocation),
            commitment_pct: pct(committed, allocation),
            growth_pct: growth(allocation, previous),
            is_prediction: false,
        }
    }
}

impl HistorySummary {
    /// Summarize `history` in ascending year order.
    pub fn from_dataset(history: &HistoricalDataset) -> Self {
        let mut records: Vec<_> = history.records.iter().collect();
        records.sort_by_key(|r| r.year);

        let mut previous = None;
        let years: Vec<YearSummary> = records
            .into_iter()
            .map(|r| {
                let row = YearSummary::new(r.year, r.allocation, r.committed, r.spent, previous);
                previous = Some(r.allocation);
                row
            })
            .collect();

        HistorySummary {
            average_utilization_pct: mean(years.iter().map(|y| y.utilization_pct)),
            average_commitment_pct: mean(years.iter().map(|y| y.commitment_pct)),
            average_growth_pct: mean(years.iter().map(|y| y.growth_pct)),
            years,
        }
    }

    /// Append the predicted year as a flagged row.
    pub fn with_prediction(mut self, outcome: &PredictionOutcome) -> Self {
        let (allocation, committed, spent) = outcome.amounts();
        let previous = self.years.last().map(|y| y.allocation);
        let mut row = YearSummary::new(
            outcome.next_year(),
            allocation as f64,
            committed as f64,
            spent as f64,
            previous,
        );
        row.is_prediction = true;
        self.years.push(row);
        self
    }

    /// Historical rows only.
    pub fn historical(&self) -> impl Iterator<Item = &YearSummary> {
        self.years.iter().filter(|y| !y.is_prediction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::PlanningInputs;
    use crate::result::FallbackResult;
    use bp_config::Variant;

    fn approx(a: Option<f64>, b: f64) -> bool {
        a.map(|a| (a - b).abs() < 1e-6).unwrap_or(false)
    }

    #[test]
    fn builtin_history_percentages() {
        let summary = HistorySummary::from_dataset(&HistoricalDataset::builtin());
        assert_eq!(summary.years.len(), 3);
        assert_eq!(summary.years[0].year, 2020);
        assert_eq!(summary.years[0].growth_pct, None);

        assert!(approx(summary.years[1].growth_pct, 10.605_276_314));
        assert!(approx(summary.years[2].utilization_pct, 434_047_435.0 / 450_000_000.0 * 100.0));
        assert!(approx(summary.years[2].commitment_pct, 434_344_498.0 / 450_000_000.0 * 100.0));
        assert!(summary.average_growth_pct.is_some());
        assert!(summary.years.iter().all(|y| !y.is_prediction));
    }

    #[test]
    fn unsorted_history_is_ordered() {
        let mut history = HistoricalDataset::builtin();
        history.records.reverse();
        let summary = HistorySummary::from_dataset(&history);
        let years: Vec<_> = summary.years.iter().map(|y| y.year).collect();
        assert_eq!(years, vec![2020, 2021, 2022]);
    }

    #[test]
    fn zero_allocation_has_no_percentages() {
        let mut history = HistoricalDataset::builtin();
        history.records.truncate(1);
        history.records[0].allocation = 0.0;
        let summary = HistorySummary::from_dataset(&history);
        assert_eq!(summary.years[0].utilization_pct, None);
        assert_eq!(summary.average_utilization_pct, None);
        assert_eq!(summary.average_growth_pct, None);
    }

    #[test]
    fn prediction_row_is_flagged_and_excluded_from_averages() {
        let summary = HistorySummary::from_dataset(&HistoricalDataset::builtin());
        let before = summary.average_utilization_pct;
        let outcome = PredictionOutcome::Fallback(FallbackResult::new(
            &Variant::Updated.schema(),
            &PlanningInputs::new(),
            "test".into(),
        ));
        let summary = summary.with_prediction(&outcome);
        let last = summary.years.last().unwrap();
        assert!(last.is_prediction);
        assert_eq!(last.year, 2024);
        assert!(approx(last.growth_pct, 480.0 / 450.0 * 100.0 - 100.0));
        assert_eq!(summary.average_utilization_pct, before);
        assert_eq!(summary.historical().count(), 3);
    }
}

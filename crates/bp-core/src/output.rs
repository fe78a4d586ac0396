//! Rendering of prediction outcomes and history summaries.
//!
//! `json` is the outcome itself, pretty-printed. `report` wraps it in the
//! export document with INR-formatted amounts. `md` and `summary` are for
//! people.

use crate::history::HistorySummary;
use crate::input::PlanningInputs;
use crate::result::PredictionOutcome;
use bp_common::OutputFormat;
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Write;

/// Format a rupee amount with Indian digit grouping: `₹48,00,00,000`.
///
/// The last three digits form one group; the rest are grouped in pairs.
pub fn format_inr(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let sign = if amount < 0 { "-" } else { "" };

    if digits.len() <= 3 {
        return format!("{}₹{}", sign, digits);
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 2 {
        groups.push(&head[end - 2..end]);
        end -= 2;
    }
    groups.push(&head[..end]);
    groups.reverse();

    format!("{}₹{},{}", sign, groups.join(","), tail)
}

/// Confidence as a percentage with one decimal, e.g. `95.0%`.
pub fn format_confidence(confidence: f64) -> String {
    format!("{:.1}%", confidence * 100.0)
}

/// INR-formatted amounts of the export report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ReportAmounts {
    pub allocation: String,
    pub committed: String,
    pub spent: String,
}

/// Export report document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BudgetReport {
    pub title: String,
    pub generated_on: NaiveDate,
    pub predictions: ReportAmounts,
    pub confidence: String,
    pub factors: PlanningInputs,
}

impl BudgetReport {
    pub fn new(outcome: &PredictionOutcome, generated_on: NaiveDate) -> Self {
        let (allocation, committed, spent) = outcome.amounts();
        BudgetReport {
            title: format!("Budget Prediction Report - {}", outcome.next_year()),
            generated_on,
            predictions: ReportAmounts {
                allocation: format_inr(allocation),
                committed: format_inr(committed),
                spent: format_inr(spent),
            },
            confidence: format_confidence(outcome.confidence()),
            factors: outcome.factors().clone(),
        }
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Render a prediction outcome. `today` stamps the export report.
pub fn render_outcome(
    outcome: &PredictionOutcome,
    format: OutputFormat,
    today: NaiveDate,
) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(outcome),
        OutputFormat::Report => serde_json::to_string_pretty(&BudgetReport::new(outcome, today)),
        OutputFormat::Summary => Ok(outcome_summary(outcome)),
        OutputFormat::Md => Ok(outcome_markdown(outcome)),
    }
}

fn outcome_summary(outcome: &PredictionOutcome) -> String {
    let (allocation, committed, spent) = outcome.amounts();
    let mut line = format!(
        "[{}] allocation {} | committed {} | spent {} | confidence {}",
        outcome.next_year(),
        format_inr(allocation),
        format_inr(committed),
        format_inr(spent),
        format_confidence(outcome.confidence()),
    );
    if let Some(error) = outcome.error() {
        let _ = write!(line, " | fallback: {}", error);
    }
    line
}

fn outcome_markdown(outcome: &PredictionOutcome) -> String {
    let (allocation, committed, spent) = outcome.amounts();
    let mut out = String::new();

    let _ = writeln!(out, "# Budget Prediction {}", outcome.next_year());
    let _ = writeln!(out);
    if let Some(error) = outcome.error() {
        let _ = writeln!(out, "> Fallback figures: {}", error);
        let _ = writeln!(out);
    }
    let _ = writeln!(out, "| Figure | Amount |");
    let _ = writeln!(out, "|---|---:|");
    let _ = writeln!(out, "| Allocation | {} |", format_inr(allocation));
    let _ = writeln!(out, "| Committed | {} |", format_inr(committed));
    let _ = writeln!(out, "| Spent | {} |", format_inr(spent));
    let _ = writeln!(out);
    let _ = writeln!(out, "Confidence: {}", format_confidence(outcome.confidence()));

    if let PredictionOutcome::Computed(result) = outcome {
        if let Some(perf) = &result.model_performance {
            let _ = writeln!(out);
            let _ = writeln!(out, "## Model performance");
            let _ = writeln!(out);
            let _ = writeln!(out, "| Target | R² | MAE |");
            let _ = writeln!(out, "|---|---:|---:|");
            let _ = writeln!(out, "| allocation | {:.4} | {:.2} |", perf.allocation_r2, perf.allocation_mae);
            let _ = writeln!(out, "| committed | {:.4} | {:.2} |", perf.committed_r2, perf.committed_mae);
            let _ = writeln!(out, "| spent | {:.4} | {:.2} |", perf.spent_r2, perf.spent_mae);
        }
        if let Some(info) = &result.model_info {
            let f = &info.impact_factors;
            let _ = writeln!(out);
            let _ = writeln!(out, "## Trend model");
            let _ = writeln!(out);
            let _ = writeln!(out, "Base growth rate: {:.1}%", info.base_growth_rate * 100.0);
            let _ = writeln!(out);
            let _ = writeln!(out, "| Impact | Amount |");
            let _ = writeln!(out, "|---|---:|");
            for (name, value) in [
                ("promotions", f.promotions),
                ("newJoinees", f.new_joinees),
                ("newJoineeBasicPay", f.new_joinee_basic_pay),
                ("retirements", f.retirements),
                ("gratuity", f.gratuity),
                ("increments", f.increments),
                ("basicPay", f.basic_pay),
            ] {
                let _ = writeln!(out, "| {} | {} |", name, format_inr(value.round() as i64));
            }
        }
        if let Some(notes) = &result.feature_importance {
            let _ = writeln!(out);
            let _ = writeln!(out, "## Feature notes");
            let _ = writeln!(out);
            for (column, note) in notes {
                let _ = writeln!(out, "- `{}`: {}", column, display_value(note));
            }
        }
    }

    let factors = outcome.factors();
    if !factors.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "## Planning inputs");
        let _ = writeln!(out);
        let _ = writeln!(out, "| Input | Value |");
        let _ = writeln!(out, "|---|---|");
        for (key, value) in factors {
            let _ = writeln!(out, "| {} | {} |", key, display_value(value));
        }
    }

    out
}

fn pct_cell(value: Option<f64>) -> String {
    value.map(|v| format!("{:.2}%", v)).unwrap_or_else(|| "n/a".to_string())
}

/// Render a history summary. `report` renders as JSON.
pub fn render_history(summary: &HistorySummary, format: OutputFormat) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Json | OutputFormat::Report => serde_json::to_string_pretty(summary),
        OutputFormat::Summary => {
            let first = summary.historical().next().map(|y| y.year);
            let last = summary.historical().last().map(|y| y.year);
            let span = match (first, last) {
                (Some(a), Some(b)) => format!("{}-{}", a, b),
                _ => "none".to_string(),
            };
            Ok(format!(
                "history {} ({} years) | avg utilization {} | avg commitment {} | avg growth {}",
                span,
                summary.historical().count(),
                pct_cell(summary.average_utilization_pct),
                pct_cell(summary.average_commitment_pct),
                pct_cell(summary.average_growth_pct),
            ))
        }
        OutputFormat::Md => {
            let mut out = String::new();
            let _ = writeln!(out, "# Budget History");
            let _ = writeln!(out);
            let _ = writeln!(out, "| Year | Allocation | Committed | Spent | Utilization | Commitment | Growth |");
            let _ = writeln!(out, "|---|---:|---:|---:|---:|---:|---:|");
            for y in &summary.years {
                let year = if y.is_prediction {
                    format!("{} (predicted)", y.year)
                } else {
                    y.year.to_string()
                };
                let _ = writeln!(
                    out,
                    "| {} | {} | {} | {} | {} | {} | {} |",
                    year,
                    format_inr(y.allocation.round() as i64),
                    format_inr(y.committed.round() as i64),
                    format_inr(y.spent.round() as i64),
                    pct_cell(y.utilization_pct),
                    pct_cell(y.commitment_pct),
                    pct_cell(y.growth_pct),
                );
            }
            let _ = writeln!(out);
            let _ = writeln!(out, "Average utilization: {}", pct_cell(summary.average_utilization_pct));
            let _ = writeln!(out, "Average commitment: {}", pct_cell(summary.average_commitment_pct));
            let _ = writeln!(out, "Average growth: {}", pct_cell(summary.average_growth_pct));
            Ok(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::FallbackResult;
    use bp_config::{HistoricalDataset, Variant};
    use serde_json::json;

    fn fallback() -> PredictionOutcome {
        let mut inputs = PlanningInputs::new();
        inputs.insert("promotions".into(), json!("abc"));
        PredictionOutcome::Fallback(FallbackResult::new(
            &Variant::Updated.schema(),
            &inputs,
            "invalid planning input".into(),
        ))
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 31).unwrap()
    }

    #[test]
    fn inr_grouping() {
        assert_eq!(format_inr(0), "₹0");
        assert_eq!(format_inr(999), "₹999");
        assert_eq!(format_inr(1_000), "₹1,000");
        assert_eq!(format_inr(100_000), "₹1,00,000");
        assert_eq!(format_inr(1_234_567), "₹12,34,567");
        assert_eq!(format_inr(480_000_000), "₹48,00,00,000");
        assert_eq!(format_inr(-450_431_824), "-₹45,04,31,824");
        assert_eq!(format_inr(i64::MIN), "-₹92,23,37,20,36,85,47,75,808");
    }

    #[test]
    fn confidence_percent() {
        assert_eq!(format_confidence(0.95), "95.0%");
        assert_eq!(format_confidence(0.75), "75.0%");
    }

    #[test]
    fn report_document_shape() {
        let text = render_outcome(&fallback(), OutputFormat::Report, day()).unwrap();
        let doc: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(doc["title"], "Budget Prediction Report - 2024");
        assert_eq!(doc["generatedOn"], "2024-03-31");
        assert_eq!(doc["predictions"]["allocation"], "₹48,00,00,000");
        assert_eq!(doc["predictions"]["spent"], "₹45,00,00,000");
        assert_eq!(doc["confidence"], "75.0%");
        assert_eq!(doc["factors"]["promotions"], "abc");
    }

    #[test]
    fn json_is_the_outcome() {
        let text = render_outcome(&fallback(), OutputFormat::Json, day()).unwrap();
        let back: PredictionOutcome = serde_json::from_str(&text).unwrap();
        assert_eq!(back, fallback());
    }

    #[test]
    fn summary_mentions_fallback() {
        let line = render_outcome(&fallback(), OutputFormat::Summary, day()).unwrap();
        assert!(line.starts_with("[2024] allocation ₹48,00,00,000"));
        assert!(line.contains("fallback: invalid planning input"));
        assert!(!line.contains('\n'));
    }

    #[test]
    fn markdown_has_tables() {
        let md = render_outcome(&fallback(), OutputFormat::Md, day()).unwrap();
        assert!(md.starts_with("# Budget Prediction 2024"));
        assert!(md.contains("| Committed | ₹46,50,00,000 |"));
        assert!(md.contains("| promotions | abc |"));
        assert!(md.contains("> Fallback figures"));
    }

    #[test]
    fn history_markdown_marks_prediction() {
        let summary = HistorySummary::from_dataset(&HistoricalDataset::builtin()).with_prediction(&fallback());
        let md = render_history(&summary, OutputFormat::Md).unwrap();
        assert!(md.contains("| 2020 | ₹38,42,49,300 |"));
        assert!(md.contains("2024 (predicted)"));
        assert!(md.contains("| n/a |"));

        let line = render_history(&summary, OutputFormat::Summary).unwrap();
        assert!(line.starts_with("history 2020-2022 (3 years)"));
    }
}

//! Column standardization (zero mean, unit variance).
//!
//! Statistics use the population variance (divide by n), and columns whose
//! spread is numerically zero keep a scale of 1 so they pass through centred
//! but otherwise unchanged.

use serde::{Deserialize, Serialize};

use super::ols::FitError;

/// Columns with a standard deviation below this are treated as constant.
const ZERO_SCALE_EPS: f64 = 10.0 * f64::EPSILON;

/// Per-column mean and scale learned from a training matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    /// Learn column statistics from row-major training data.
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self, FitError> {
        let n_cols = check_rectangular(rows)?;
        let n = rows.len() as f64;

        let mut mean = vec![0.0; n_cols];
        for row in rows {
            for (m, v) in mean.iter_mut().zip(row) {
                *m += v;
            }
        }
        for m in &mut mean {
            *m /= n;
        }

        let mut var = vec![0.0; n_cols];
        for row in rows {
            for ((acc, v), m) in var.iter_mut().zip(row).zip(&mean) {
                let d = v - m;
                *acc += d * d;
            }
        }

        let scale = var
            .into_iter()
            .map(|ss| {
                let sd = (ss / n).sqrt();
                if sd < ZERO_SCALE_EPS {
                    1.0
                } else {
                    sd
                }
            })
            .collect();

        Ok(StandardScaler { mean, scale })
    }

    /// Number of columns the scaler was fitted on.
    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn scale(&self) -> &[f64] {
        &self.scale
    }

    /// Standardize a single row. Extra trailing values are ignored and
    /// missing ones are treated as the column mean.
    pub fn transform_row(&self, row: &[f64]) -> Vec<f64> {
        self.mean
            .iter()
            .zip(&self.scale)
            .enumerate()
            .map(|(j, (m, s))| row.get(j).map_or(0.0, |v| (v - m) / s))
            .collect()
    }

    /// Standardize every row.
    pub fn transform(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        rows.iter().map(|r| self.transform_row(r)).collect()
    }
}

/// Verify that `rows` is non-empty and rectangular; returns the column count.
pub(crate) fn check_rectangular(rows: &[Vec<f64>]) -> Result<usize, FitError> {
    let first = rows.first().ok_or(FitError::Empty)?;
    let expected = first.len();
    for (row, values) in rows.iter().enumerate() {
        if values.len() != expected {
            return Err(FitError::Ragged {
                row,
                expected,
                found: values.len(),
            });
        }
    }
    Ok(expected)
}

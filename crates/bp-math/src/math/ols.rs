//! Ordinary least squares with an intercept.
//!
//! The design matrix and target are centred, then the minimum-norm
//! least-squares solution is taken from an SVD pseudo-inverse. This keeps the
//! fit well defined when there are fewer samples than features (the usual
//! case for a three-year budget history), where the normal equations are
//! singular and many coefficient vectors reproduce the training targets
//! exactly.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use super::scaler::check_rectangular;

/// Singular values below `RCOND * sigma_max` are treated as zero.
pub const RCOND: f64 = 1e-10;

/// SVD convergence tolerance, nalgebra's default. Tighter values leave the
/// decomposition inaccurate and the solution off the minimum-norm point.
const SVD_EPS: f64 = 5.0 * f64::EPSILON;

/// Zero means iterate until convergence.
const SVD_MAX_ITERS: usize = 0;

/// Reasons a fit can fail.
#[derive(Debug, Clone, PartialEq)]
pub enum FitError {
    /// No training rows.
    Empty,
    /// A row has a different number of columns than the first row.
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },
    /// Number of targets differs from number of rows.
    LengthMismatch { rows: usize, targets: usize },
    /// Training data contains NaN or infinity.
    NonFinite,
    /// The SVD did not converge or produced a non-finite solution.
    Singular,
}

impl std::fmt::Display for FitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FitError::Empty => write!(f, "no training rows"),
            FitError::Ragged {
                row,
                expected,
                found,
            } => write!(
                f,
                "row {} has {} columns, expected {}",
                row, found, expected
            ),
            FitError::LengthMismatch { rows, targets } => {
                write!(f, "{} training rows but {} targets", rows, targets)
            }
            FitError::NonFinite => write!(f, "training data contains non-finite values"),
            FitError::Singular => write!(f, "least-squares solve did not produce a finite solution"),
        }
    }
}

impl std::error::Error for FitError {}

/// Fitted linear model `y = intercept + x · coefficients`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    coefficients: Vec<f64>,
    intercept: f64,
}

impl LinearModel {
    /// Fit by ordinary least squares with an intercept term.
    pub fn fit(rows: &[Vec<f64>], targets: &[f64]) -> Result<Self, FitError> {
        let n_cols = check_rectangular(rows)?;
        let n = rows.len();
        if targets.len() != n {
            return Err(FitError::LengthMismatch {
                rows: n,
                targets: targets.len(),
            });
        }
        if rows.iter().flatten().chain(targets).any(|v| !v.is_finite()) {
            return Err(FitError::NonFinite);
        }

        let nf = n as f64;
        let y_mean = targets.iter().sum::<f64>() / nf;
        let x_mean: Vec<f64> = (0..n_cols)
            .map(|j| rows.iter().map(|r| r[j]).sum::<f64>() / nf)
            .collect();

        if n_cols == 0 {
            return Ok(LinearModel {
                coefficients: Vec::new(),
                intercept: y_mean,
            });
        }

        let xc = DMatrix::from_fn(n, n_cols, |i, j| rows[i][j] - x_mean[j]);
        let yc = DVector::from_fn(n, |i, _| targets[i] - y_mean);

        let beta = solve_min_norm(&xc, &yc).ok_or(FitError::Singular)?;
        let coefficients: Vec<f64> = beta.iter().copied().collect();
        let intercept = y_mean
            - x_mean
                .iter()
                .zip(&coefficients)
                .map(|(m, b)| m * b)
                .sum::<f64>();

        Ok(LinearModel {
            coefficients,
            intercept,
        })
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Predict a single row. Missing trailing values contribute nothing.
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(row)
                .map(|(b, x)| b * x)
                .sum::<f64>()
    }

    pub fn predict(&self, rows: &[Vec<f64>]) -> Vec<f64> {
        rows.iter().map(|r| self.predict_row(r)).collect()
    }
}

/// Minimum-norm solution of `min ||x β - y||` via SVD.
///
/// Returns `None` if the decomposition fails or the solution is not finite.
/// An all-zero design yields the zero vector.
pub fn solve_min_norm(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    if x.nrows() != y.len() {
        return None;
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return None;
    }

    let svd = x.clone().try_svd(true, true, SVD_EPS, SVD_MAX_ITERS)?;
    let sigma_max = svd.singular_values.iter().copied().fold(0.0, f64::max);
    if sigma_max == 0.0 {
        return Some(DVector::zeros(x.ncols()));
    }

    let beta = svd.solve(y, sigma_max * RCOND).ok()?;
    if beta.iter().all(|v| v.is_finite()) {
        Some(beta)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol.max(tol * a.abs().max(b.abs()))
    }

    #[test]
    fn recovers_simple_line() {
        // y = 2 + 3x
        let rows = vec![vec![0.0], vec![1.0], vec![2.0]];
        let y = [2.0, 5.0, 8.0];
        let model = LinearModel::fit(&rows, &y).unwrap();
        assert!(approx_eq(model.intercept(), 2.0, 1e-10));
        assert!(approx_eq(model.coefficients()[0], 3.0, 1e-10));
        assert!(approx_eq(model.predict_row(&[10.0]), 32.0, 1e-10));
    }

    #[test]
    fn overdetermined_fit_is_least_squares() {
        // Points scattered around y = x; OLS slope is cov/var.
        let rows = vec![vec![0.0], vec![1.0], vec![2.0], vec![3.0]];
        let y = [0.0, 2.0, 1.0, 3.0];
        let model = LinearModel::fit(&rows, &y).unwrap();
        assert!(approx_eq(model.coefficients()[0], 0.8, 1e-10));
        assert!(approx_eq(model.intercept(), 0.3, 1e-10));
    }

    #[test]
    fn wide_design_interpolates_training_rows() {
        // More features than samples: fit should reproduce the targets.
        let rows = vec![
            vec![1.0, 0.0, 2.0, 5.0],
            vec![0.0, 1.0, 1.0, 3.0],
            vec![2.0, 1.0, 0.0, 4.0],
        ];
        let y = [10.0, 20.0, 15.0];
        let model = LinearModel::fit(&rows, &y).unwrap();
        for (pred, want) in model.predict(&rows).iter().zip(&y) {
            assert!(approx_eq(*pred, *want, 1e-9), "{} vs {}", pred, want);
        }
    }

    #[test]
    fn min_norm_solution_ignores_null_space() {
        // Duplicate columns: minimum-norm solution splits the weight evenly.
        let x = DMatrix::from_row_slice(2, 2, &[1.0, 1.0, 2.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 4.0]);
        let beta = solve_min_norm(&x, &y).unwrap();
        assert!(approx_eq(beta[0], 1.0, 1e-10));
        assert!(approx_eq(beta[1], 1.0, 1e-10));
    }

    #[test]
    fn proportional_budget_columns_share_weight_equally() {
        // 2020-2022 staffing history, original feature order:
        // promotions, retirements, new_joinees, increment_jan, increment_jul,
        // basic_pay_diff, gratuity, pay_level.
        let rows = vec![
            vec![15.0, 8.0, 12.0, 3.0, 2.5, 2_500_000.0, 1_200_000.0, 7.5],
            vec![18.0, 6.0, 15.0, 3.5, 3.0, 3_200_000.0, 900_000.0, 8.0],
            vec![20.0, 10.0, 18.0, 4.0, 3.5, 3_800_000.0, 1_500_000.0, 8.5],
        ];
        let allocation = [384_249_300.0, 425_000_000.0, 450_000_000.0];
        let scaler = crate::StandardScaler::fit(&rows).unwrap();
        let model = LinearModel::fit(&scaler.transform(&rows), &allocation).unwrap();
        let beta = model.coefficients();

        // retirements and gratuity standardize to the same column.
        assert!(approx_eq(beta[1], beta[6], 1e-6), "{} vs {}", beta[1], beta[6]);
        assert!(approx_eq(beta[1], -1_678_742.143_884, 1e-6), "{}", beta[1]);
        // new_joinees, both increments and pay_level likewise.
        for j in [3, 4, 7] {
            assert!(approx_eq(beta[2], beta[j], 1e-6), "{} vs {}", beta[2], beta[j]);
        }
    }

    #[test]
    fn constant_features_fall_back_to_mean() {
        let rows = vec![vec![3.0], vec![3.0], vec![3.0]];
        let y = [1.0, 2.0, 6.0];
        let model = LinearModel::fit(&rows, &y).unwrap();
        assert_eq!(model.coefficients(), &[0.0]);
        assert!(approx_eq(model.intercept(), 3.0, 1e-12));
    }

    #[test]
    fn no_features_predicts_mean() {
        let rows = vec![vec![], vec![]];
        let model = LinearModel::fit(&rows, &[4.0, 8.0]).unwrap();
        assert!(approx_eq(model.predict_row(&[]), 6.0, 1e-12));
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let rows = vec![vec![1.0], vec![2.0]];
        assert_eq!(
            LinearModel::fit(&rows, &[1.0]),
            Err(FitError::LengthMismatch {
                rows: 2,
                targets: 1
            })
        );
    }

    #[test]
    fn non_finite_training_data_is_rejected() {
        let rows = vec![vec![1.0], vec![f64::NAN]];
        assert_eq!(LinearModel::fit(&rows, &[1.0, 2.0]), Err(FitError::NonFinite));
    }

    #[test]
    fn fit_error_display() {
        assert_eq!(FitError::Empty.to_string(), "no training rows");
        assert_eq!(
            FitError::LengthMismatch {
                rows: 3,
                targets: 2
            }
            .to_string(),
            "3 training rows but 2 targets"
        );
    }
}

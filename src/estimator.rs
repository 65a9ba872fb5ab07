//! Ordinary least squares estimation behind a trait seam.
//!
//! The predictor only needs the fit/predict contract, so alternative
//! estimators (regularized, robust) can be swapped in without touching the
//! forecast loop.

use crate::error::{ForecastError, Result};

/// Coefficients and residuals produced by a fit.
#[derive(Debug, Clone, PartialEq)]
pub struct EstimatorFit {
    /// One coefficient per regressor column, in the caller's column order.
    pub coefficients: Vec<f64>,
    /// Residuals aligned to the fitted observations.
    pub residuals: Vec<f64>,
}

/// Fit/predict contract for the regression estimator.
///
/// `regressors` is column-major: one inner vector per regressor, all the
/// same length as `target`. Column order is the caller's contract and must
/// match between fit and predict.
pub trait Estimator {
    fn fit(&self, target: &[f64], regressors: &[Vec<f64>]) -> Result<EstimatorFit>;

    /// Predict a single observation as the linear combination of a row.
    fn predict(&self, coefficients: &[f64], row: &[f64]) -> f64 {
        debug_assert_eq!(coefficients.len(), row.len());
        coefficients.iter().zip(row).map(|(c, x)| c * x).sum()
    }
}

/// OLS via the normal equations, solved by Cholesky decomposition.
///
/// There is deliberately no ridge term on the diagonal: a rank-deficient
/// regressor set must surface as [`ForecastError::SingularMatrix`] instead
/// of being silently regularized away.
#[derive(Debug, Clone, Copy, Default)]
pub struct OlsEstimator;

impl OlsEstimator {
    pub fn new() -> Self {
        Self
    }
}

impl Estimator for OlsEstimator {
    fn fit(&self, target: &[f64], regressors: &[Vec<f64>]) -> Result<EstimatorFit> {
        let n = target.len();
        let k = regressors.len();

        if k == 0 {
            return Err(ForecastError::InvalidInput(
                "at least one regressor column is required".to_string(),
            ));
        }
        for column in regressors {
            if column.len() != n {
                return Err(ForecastError::DimensionMismatch {
                    expected: n,
                    got: column.len(),
                });
            }
        }
        if n < k {
            return Err(ForecastError::InsufficientData { needed: k, got: n });
        }

        // Normal equations: X'X b = X'y.
        let mut xtx = vec![vec![0.0; k]; k];
        let mut xty = vec![0.0; k];
        for i in 0..k {
            for j in 0..=i {
                let s: f64 = regressors[i]
                    .iter()
                    .zip(&regressors[j])
                    .map(|(a, b)| a * b)
                    .sum();
                xtx[i][j] = s;
                xtx[j][i] = s;
            }
            xty[i] = regressors[i].iter().zip(target).map(|(a, y)| a * y).sum();
        }

        let coefficients = solve_symmetric(&xtx, &xty).ok_or_else(|| {
            ForecastError::SingularMatrix(
                "normal equations are not positive definite".to_string(),
            )
        })?;

        let residuals: Vec<f64> = (0..n)
            .map(|row| {
                let fitted: f64 = (0..k).map(|c| coefficients[c] * regressors[c][row]).sum();
                target[row] - fitted
            })
            .collect();

        Ok(EstimatorFit {
            coefficients,
            residuals,
        })
    }
}

/// Solve a symmetric positive definite system via Cholesky decomposition.
///
/// Returns `None` when the matrix is not positive definite.
fn solve_symmetric(a: &[Vec<f64>], b: &[f64]) -> Option<Vec<f64>> {
    let n = b.len();
    if n == 0 || a.len() != n {
        return None;
    }

    // A = L L'
    let mut l = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i][j];
            for k in 0..j {
                sum -= l[i][k] * l[j][k];
            }
            if i == j {
                if sum <= 0.0 {
                    return None;
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }

    // Forward substitution: L y = b.
    let mut y = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum -= l[i][j] * y[j];
        }
        y[i] = sum / l[i][i];
    }

    // Backward substitution: L' x = y.
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = y[i];
        for j in (i + 1)..n {
            sum -= l[j][i] * x[j];
        }
        x[i] = sum / l[i][i];
    }

    Some(x)
}

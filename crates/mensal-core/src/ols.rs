//! Ordinary least squares on small design matrices.
//!
//! The ARIMA and unit-root test regressions involve at most a handful of
//! unknowns, so the normal equations are solved directly with Gauss-Jordan
//! elimination.

use crate::error::{AnalysisError, Result};

/// Result of an OLS fit.
#[derive(Debug, Clone)]
pub struct OlsFit {
    /// Coefficients; intercept first when one was requested
    pub coefficients: Vec<f64>,
    /// Standard errors, aligned with `coefficients`
    pub std_errors: Vec<f64>,
    /// Residuals y - Xb
    pub residuals: Vec<f64>,
    /// Residual variance SSE / (n - k)
    pub sigma2: f64,
}

/// Invert a symmetric positive-definite matrix in place via Gauss-Jordan.
fn invert(matrix: &mut [Vec<f64>]) -> Result<Vec<Vec<f64>>> {
    let k = matrix.len();
    let mut inverse: Vec<Vec<f64>> = (0..k)
        .map(|i| (0..k).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
        .collect();

    for col in 0..k {
        // Partial pivoting
        let mut pivot_row = col;
        for row in (col + 1)..k {
            if matrix[row][col].abs() > matrix[pivot_row][col].abs() {
                pivot_row = row;
            }
        }
        if matrix[pivot_row][col].abs() < 1e-12 {
            return Err(AnalysisError::ComputationError(
                "Singular design matrix in least squares".into(),
            ));
        }
        matrix.swap(col, pivot_row);
        inverse.swap(col, pivot_row);

        let pivot = matrix[col][col];
        for j in 0..k {
            matrix[col][j] /= pivot;
            inverse[col][j] /= pivot;
        }

        for row in 0..k {
            if row == col {
                continue;
            }
            let factor = matrix[row][col];
            if factor == 0.0 {
                continue;
            }
            for j in 0..k {
                matrix[row][j] -= factor * matrix[col][j];
                inverse[row][j] -= factor * inverse[col][j];
            }
        }
    }

    Ok(inverse)
}

/// Fit y = Xb by OLS. `columns` are the regressor columns; an intercept
/// column is prepended when `intercept` is true.
pub fn ols(y: &[f64], columns: &[Vec<f64>], intercept: bool) -> Result<OlsFit> {
    let n = y.len();
    let k = columns.len() + usize::from(intercept);

    if k == 0 {
        return Err(AnalysisError::InvalidInput(
            "Least squares needs at least one regressor".into(),
        ));
    }
    if n <= k {
        return Err(AnalysisError::InsufficientData {
            needed: k + 1,
            got: n,
        });
    }
    for (j, col) in columns.iter().enumerate() {
        if col.len() != n {
            return Err(AnalysisError::InvalidInput(format!(
                "Regressor {} has {} rows but y has {}",
                j,
                col.len(),
                n
            )));
        }
    }

    let x_at = |row: usize, col: usize| -> f64 {
        if intercept {
            if col == 0 {
                1.0
            } else {
                columns[col - 1][row]
            }
        } else {
            columns[col][row]
        }
    };

    // Normal equations: (X'X) b = X'y
    let mut xtx: Vec<Vec<f64>> = vec![vec![0.0; k]; k];
    let mut xty = vec![0.0; k];
    for row in 0..n {
        for i in 0..k {
            let xi = x_at(row, i);
            xty[i] += xi * y[row];
            for j in i..k {
                xtx[i][j] += xi * x_at(row, j);
            }
        }
    }
    for i in 0..k {
        for j in 0..i {
            xtx[i][j] = xtx[j][i];
        }
    }

    let xtx_inv = invert(&mut xtx)?;

    let coefficients: Vec<f64> = (0..k)
        .map(|i| (0..k).map(|j| xtx_inv[i][j] * xty[j]).sum())
        .collect();

    let residuals: Vec<f64> = (0..n)
        .map(|row| {
            let fitted: f64 = (0..k).map(|j| coefficients[j] * x_at(row, j)).sum();
            y[row] - fitted
        })
        .collect();

    let sse: f64 = residuals.iter().map(|e| e * e).sum();
    let sigma2 = sse / (n - k) as f64;

    let std_errors: Vec<f64> = (0..k).map(|i| (sigma2 * xtx_inv[i][i]).sqrt()).collect();

    Ok(OlsFit {
        coefficients,
        std_errors,
        residuals,
        sigma2,
    })
}

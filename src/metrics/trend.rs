//! Least-squares trend line over an evenly spaced series.

use nalgebra::{DMatrix, DVector};

/// `y = intercept + slope × x`, with `x` the zero-based series index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trend {
    pub intercept: f64,
    pub slope: f64,
}

impl Trend {
    pub fn at(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Fit a straight line to `ys` against `0..n`.
///
/// Returns `None` for fewer than two points or a non-finite series.
pub fn linear_trend(ys: &[f64]) -> Option<Trend> {
    if ys.len() < 2 || ys.iter().any(|y| !y.is_finite()) {
        return None;
    }

    let n = ys.len();
    let x = DMatrix::from_fn(n, 2, |row, col| if col == 0 { 1.0 } else { row as f64 });
    let y = DVector::from_column_slice(ys);

    let beta = solve_least_squares(&x, &y)?;
    Some(Trend {
        intercept: beta[0],
        slope: beta[1],
    })
}

/// SVD least squares, loosening the singular value cut-off until a finite
/// solution is found.
fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);
    for eps in [1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, eps) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }
    None
}

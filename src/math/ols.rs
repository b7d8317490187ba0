//! Ordinary least squares.
//!
//! The geometric-process fit solves one tiny regression per date:
//!
//! ```text
//! minimize Σ (y_k - (R·x_k + P))^2
//! ```
//!
//! with `x_k` the day offset inside the window and `y_k` the log value.
//! We solve it through nalgebra's SVD, which handles tall design matrices
//! (more rows than columns) and rank-deficient inputs without panicking.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Result of a straight-line fit `y = slope·x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFit {
    pub slope: f64,
    pub intercept: f64,
    /// Sum of squared residuals; reported as 0 when the fit is exactly
    /// determined (two points).
    pub sse: f64,
}

/// Fit a line through `(x, y)` pairs.
///
/// Returns `None` with fewer than two points or when all `x` coincide.
pub fn fit_line(points: &[(f64, f64)]) -> Option<LineFit> {
    let n = points.len();
    if n < 2 {
        return None;
    }

    // Column 0: offset, column 1: intercept.
    let x = DMatrix::from_fn(n, 2, |i, j| if j == 0 { points[i].0 } else { 1.0 });
    let y = DVector::from_iterator(n, points.iter().map(|p| p.1));

    let first_x = points[0].0;
    if points.iter().all(|p| (p.0 - first_x).abs() < f64::EPSILON) {
        return None;
    }

    let beta = solve_least_squares(&x, &y)?;
    let (slope, intercept) = (beta[0], beta[1]);

    let sse = if n > 2 {
        points
            .iter()
            .map(|&(xi, yi)| {
                let r = yi - (slope * xi + intercept);
                r * r
            })
            .sum()
    } else {
        0.0
    };

    Some(LineFit { slope, intercept, sse })
}

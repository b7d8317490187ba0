//! The average-growth-rate primitive.
//!
//! Given `v(t)` and `v(t - w)`, the average per-day growth rate `g` solves
//! `(1 + g)^w = v(t) / v(t - w)`:
//!
//! ```text
//! ratio = (v(t) - v(t-w)) / v(t-w)
//! g     = (1 + ratio)^(1/w) - 1
//! ```
//!
//! The division is checked before the root is taken: a zero or missing
//! `v(t - w)` gives a missing cell, never an infinity.

use crate::domain::AlignedMatrix;
use crate::error::EngineError;
use crate::math::{checked_div, finite};

/// Per-location average growth rate over `window >= 1` days.
pub fn growth_rate(matrix: &AlignedMatrix, window: usize) -> Result<AlignedMatrix, EngineError> {
    EngineError::check_window(window, 1)?;
    Ok(matrix.map_columns(|c| growth_rate_column(c, window)))
}

/// Column form of [`growth_rate`]; `window` must be at least 1.
pub fn growth_rate_column(column: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    (0..column.len())
        .map(|i| {
            let prev = i.checked_sub(window)?;
            average_growth(column[prev], column[i], window)
        })
        .collect()
}

/// Average per-period growth from `from` to `to` over `periods` periods.
pub fn average_growth(from: Option<f64>, to: Option<f64>, periods: usize) -> Option<f64> {
    if periods == 0 {
        return None;
    }
    let (from, to) = (from?, to?);
    let ratio = checked_div(Some(to - from), Some(from))?;
    let base = 1.0 + ratio;
    // A fractional root of a negative base has no real value.
    if base < 0.0 {
        return None;
    }
    finite(base.powf(1.0 / periods as f64) - 1.0)
}

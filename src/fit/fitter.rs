//! Sliding-window log-linear fit of a local geometric process.
//!
//! For each date `t` the trailing window covers the `window` calendar days
//! `t - (window - 1) ..= t`, at offsets `k = 0 .. window - 1`. Usable points
//! are the defined, strictly positive values in that window; their logs are
//! regressed on the offset:
//!
//! ```text
//! ln v(k) ≈ P + R·k
//! ```
//!
//! `R` is the local per-day log growth rate and `P` the "prior process load"
//! (the log value extrapolated to the start of the window). Each date is an
//! independent least-squares problem, so dates are evaluated in parallel and
//! collected back in date order.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::domain::{AlignedMatrix, GrowthModel, GrowthModelRow, Series, SkipReason, SkippedDate};
use crate::error::EngineError;
use crate::math::fit_line;

/// Smallest window for which a line fit is defined.
pub const MIN_FIT_WINDOW: usize = 2;

/// Fits a [`GrowthModel`] with a fixed trailing window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometricProcessFitter {
    window: usize,
}

impl GeometricProcessFitter {
    pub fn new(window: usize) -> Result<Self, EngineError> {
        EngineError::check_window(window, MIN_FIT_WINDOW)?;
        Ok(Self { window })
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Fit every date of `series`.
    ///
    /// Never fails on missing data: dates without enough usable points are
    /// recorded in `skipped` and produce no row.
    pub fn fit(&self, series: &Series) -> GrowthModel {
        debug_assert!(
            series.dates.windows(2).all(|w| w[0] < w[1]),
            "series dates strictly ascending"
        );
        let Some(first) = series.dates.first().copied() else {
            return GrowthModel {
                window: self.window,
                rows: Vec::new(),
                skipped: Vec::new(),
            };
        };

        let outcomes: Vec<(NaiveDate, Result<GrowthModelRow, SkipReason>)> = series
            .dates
            .par_iter()
            .enumerate()
            .map(|(idx, date)| (*date, self.fit_date(series, first, idx)))
            .collect();

        let mut rows = Vec::new();
        let mut skipped = Vec::new();
        for (date, outcome) in outcomes {
            match outcome {
                Ok(row) => rows.push(row),
                Err(reason) => skipped.push(SkippedDate { date, reason }),
            }
        }

        debug!(
            window = self.window,
            rows = rows.len(),
            skipped = skipped.len(),
            "fitted geometric process"
        );

        GrowthModel {
            window: self.window,
            rows,
            skipped,
        }
    }

    /// Fit every location column of `matrix`, in parallel.
    pub fn fit_matrix(&self, matrix: &AlignedMatrix) -> BTreeMap<String, GrowthModel> {
        let models: BTreeMap<String, GrowthModel> = matrix
            .locations()
            .par_iter()
            .filter_map(|location| {
                let series = matrix.series(location)?;
                Some((location.clone(), self.fit(&series)))
            })
            .collect();

        info!(
            window = self.window,
            locations = models.len(),
            rows = models.values().map(GrowthModel::len).sum::<usize>(),
            "fitted locations"
        );
        models
    }

    fn fit_date(&self, series: &Series, first: NaiveDate, idx: usize) -> Result<GrowthModelRow, SkipReason> {
        let date = series.dates[idx];
        let span = (self.window - 1) as i64;
        if (date - first).num_days() < span {
            return Err(SkipReason::InsufficientHistory);
        }
        let start = date - chrono::Duration::days(span);

        // Dates are ascending, so the window is a contiguous slice ending at idx.
        let lo = series.dates[..=idx].partition_point(|d| *d < start);
        let points: Vec<(f64, f64)> = series.dates[lo..=idx]
            .iter()
            .zip(&series.values[lo..=idx])
            .filter_map(|(d, v)| {
                let log_value = log_positive(*v)?;
                Some(((*d - start).num_days() as f64, log_value))
            })
            .collect();

        if points.len() < 2 {
            return Err(SkipReason::InsufficientPoints);
        }
        // Two or more distinct offsets always give a full-rank design.
        let line = fit_line(&points).ok_or(SkipReason::InsufficientPoints)?;

        Ok(GrowthModelRow {
            date,
            local_growth_rate: line.slope,
            prior_process_load: line.intercept,
            predicted_log_value: line.intercept + line.slope * span as f64,
            actual_log_value: log_positive(series.values[idx]),
            fit_residual: line.sse,
            n_points: points.len(),
        })
    }
}

/// Fit one series with the given window (`window >= 2`).
pub fn fit(series: &Series, window: usize) -> Result<GrowthModel, EngineError> {
    Ok(GeometricProcessFitter::new(window)?.fit(series))
}

/// Fit every location column of an aligned matrix.
pub fn fit_matrix(matrix: &AlignedMatrix, window: usize) -> Result<BTreeMap<String, GrowthModel>, EngineError> {
    Ok(GeometricProcessFitter::new(window)?.fit_matrix(matrix))
}

fn log_positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v > 0.0).map(f64::ln)
}

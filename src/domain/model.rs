//! Output of the local geometric-growth fit.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One fitted date.
///
/// The model says that over the trailing window ending at `date`,
/// `ln value(k) ≈ prior_process_load + local_growth_rate * k` for offsets
/// `k = 0 .. window-1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthModelRow {
    pub date: NaiveDate,
    /// Per-day log growth rate `R`.
    pub local_growth_rate: f64,
    /// Log value extrapolated to the first offset of the window (`P`).
    pub prior_process_load: f64,
    /// `P + R * (window - 1)`.
    pub predicted_log_value: f64,
    /// `ln value(date)`, when the observation at `date` is usable.
    pub actual_log_value: Option<f64>,
    /// Sum of squared residuals of the least-squares fit (0 for exactly 2 points).
    pub fit_residual: f64,
    /// Number of usable points in the window.
    pub n_points: usize,
}

impl GrowthModelRow {
    /// `predicted - actual`, if the actual value is known.
    pub fn prediction_error(&self) -> Option<f64> {
        self.actual_log_value.map(|a| self.predicted_log_value - a)
    }
}

/// Why a date produced no row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The window would start before the first date of the series.
    InsufficientHistory,
    /// Fewer than two positive, defined values inside the window.
    InsufficientPoints,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedDate {
    pub date: NaiveDate,
    pub reason: SkipReason,
}

/// Per-date model table for one series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthModel {
    pub window: usize,
    pub rows: Vec<GrowthModelRow>,
    /// Diagnostics only: absence of a row means "no model", never zero growth.
    pub skipped: Vec<SkippedDate>,
}

impl GrowthModel {
    pub fn row_at(&self, date: NaiveDate) -> Option<&GrowthModelRow> {
        self.rows
            .binary_search_by(|r| r.date.cmp(&date))
            .ok()
            .map(|idx| &self.rows[idx])
    }

    pub fn last(&self) -> Option<&GrowthModelRow> {
        self.rows.last()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

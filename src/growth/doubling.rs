//! Conversions between daily growth rates and doubling times.

use std::f64::consts::LN_2;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::math::finite;

/// Reference doubling periods (days) drawn as guide lines in reports.
pub const DOUBLING_PERIODS: [u32; 8] = [2, 3, 4, 5, 6, 7, 14, 28];

/// Doubling time at or above which growth counts as slow.
pub const SLOW_DOUBLING_DAYS: f64 = 28.0;

/// Days for a quantity growing at `rate` per day to double.
///
/// Negative results are halving times. Undefined for zero growth and for
/// rates at or below -100%.
pub fn rate_to_doubling_days(rate: f64) -> Option<f64> {
    if rate <= -1.0 || rate == 0.0 {
        return None;
    }
    finite(LN_2 / rate.ln_1p())
}

/// Daily growth rate that doubles a quantity in `days` days.
///
/// An infinite doubling time is zero growth; zero days has no finite rate.
pub fn doubling_days_to_rate(days: f64) -> Option<f64> {
    if days.is_infinite() {
        return Some(0.0);
    }
    finite((LN_2 / days).exp_m1())
}

/// `(period, daily rate)` for each reference doubling period.
pub fn doubling_reference_rates() -> Vec<(u32, f64)> {
    DOUBLING_PERIODS
        .iter()
        .filter_map(|days| Some((*days, doubling_days_to_rate(f64::from(*days))?)))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoublingBand {
    /// Doubling in under four weeks.
    Rapid,
    Slow,
    /// Halving takes longer than four weeks.
    Shrinking,
    /// No doubling time, or halving within four weeks.
    Flat,
}

impl DoublingBand {
    pub fn classify(rate: f64) -> Self {
        match rate_to_doubling_days(rate) {
            Some(days) if days > 0.0 && days < SLOW_DOUBLING_DAYS => DoublingBand::Rapid,
            Some(days) if days >= SLOW_DOUBLING_DAYS => DoublingBand::Slow,
            Some(days) if days < -SLOW_DOUBLING_DAYS => DoublingBand::Shrinking,
            _ => DoublingBand::Flat,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DoublingBand::Rapid => "rapid",
            DoublingBand::Slow => "slow",
            DoublingBand::Shrinking => "shrinking",
            DoublingBand::Flat => "flat",
        }
    }
}

impl fmt::Display for DoublingBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

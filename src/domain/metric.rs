//! Selectable computations.
//!
//! Each variant maps to exactly one engine operation (see
//! `growth::evaluate`). Callers pick a metric by value, not by parsing
//! suffixes out of variable names.

use crate::domain::types::Field;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricRequest {
    /// The aligned field itself, optionally as a trailing moving average.
    Level { field: Field, ma_window: Option<usize> },
    /// Average growth rate of a field over `window` days.
    Growth { field: Field, window: usize },
    /// 14-day backward difference of total cases.
    ActiveConfirmedCases { per_capita: bool },
    /// Average growth rate of the active-case estimate.
    ActiveGrowth { window: usize },
    /// Windowed increase in cases over windowed increase in tests.
    PositiveTestRate { window: usize },
    /// Total cases over (interpolated) total tests.
    CumulativePositiveTestRate,
    /// Average growth rate of the cumulative positive-test rate.
    CumulativePositiveTestGrowth { window: usize },
}

impl MetricRequest {
    /// Short label for report headers.
    pub fn label(&self) -> String {
        match self {
            MetricRequest::Level { field, ma_window: None } => field.name(),
            MetricRequest::Level {
                field,
                ma_window: Some(w),
            } => format!("{field} ({w}-day average)"),
            MetricRequest::Growth { field, window } => format!("{field} growth ({window}-day)"),
            MetricRequest::ActiveConfirmedCases { per_capita: false } => "active confirmed cases".to_string(),
            MetricRequest::ActiveConfirmedCases { per_capita: true } => {
                "active confirmed cases per million".to_string()
            }
            MetricRequest::ActiveGrowth { window } => format!("active cases growth ({window}-day)"),
            MetricRequest::PositiveTestRate { window } => format!("positive test rate ({window}-day)"),
            MetricRequest::CumulativePositiveTestRate => "cumulative positive test rate".to_string(),
            MetricRequest::CumulativePositiveTestGrowth { window } => {
                format!("cumulative positive test rate growth ({window}-day)")
            }
        }
    }

    /// Whether the values are growth rates (reported with doubling times).
    pub fn is_growth(&self) -> bool {
        matches!(
            self,
            MetricRequest::Growth { .. }
                | MetricRequest::ActiveGrowth { .. }
                | MetricRequest::CumulativePositiveTestGrowth { .. }
        )
    }
}

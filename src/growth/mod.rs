//! GrowthRateEstimator: windowed average growth rates and the composite
//! estimators built on them.
//!
//! Every estimator routes through [`growth_rate`] and the same checked
//! division, so no output cell is ever infinite or NaN.

pub mod composite;
pub mod doubling;
pub mod rate;

use tracing::debug;

use crate::dataset::CanonicalDataset;
use crate::domain::{AlignedMatrix, MetricRequest};
use crate::error::EngineError;

pub use composite::*;
pub use doubling::*;
pub use rate::*;

/// Compute the matrix a [`MetricRequest`] names.
pub fn evaluate(
    dataset: &CanonicalDataset,
    request: &MetricRequest,
    locations: &[String],
) -> Result<AlignedMatrix, EngineError> {
    debug!(metric = %request.label(), locations = locations.len(), "evaluating metric");
    match *request {
        MetricRequest::Level { field, ma_window } => dataset.var_by_location(field, locations, ma_window),
        MetricRequest::Growth { field, window } => {
            EngineError::check_window(window, 1)?;
            let levels = dataset.var_by_location(field, locations, None)?;
            growth_rate(&levels, window)
        }
        MetricRequest::ActiveConfirmedCases { per_capita } => active_confirmed_cases(dataset, locations, per_capita),
        MetricRequest::ActiveGrowth { window } => active_growth_rate(dataset, window, locations),
        MetricRequest::PositiveTestRate { window } => positive_test_rate(dataset, window, locations),
        MetricRequest::CumulativePositiveTestRate => cumulative_positive_test_rate(dataset, locations),
        MetricRequest::CumulativePositiveTestGrowth { window } => {
            cumulative_positive_test_growth_rate(dataset, window, locations)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CanonicalRecord, CanonicalTable, Field};
    use chrono::NaiveDate;

    fn dataset() -> CanonicalDataset {
        let start = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
        let records = start
            .iter_days()
            .take(6)
            .enumerate()
            .map(|(i, date)| {
                CanonicalRecord::new(date, "A")
                    .with(Field::TOTAL_CASES, 2f64.powi(i as i32))
                    .with(Field::TOTAL_TESTS, 100.0 * (i + 1) as f64)
            })
            .collect();
        CanonicalDataset::new(CanonicalTable::new(records), None)
    }

    #[test]
    fn each_request_dispatches_to_its_operation() {
        let ds = dataset();
        let locs = vec!["A".to_string()];

        let level = evaluate(&ds, &MetricRequest::Level { field: Field::TOTAL_CASES, ma_window: None }, &locs).unwrap();
        assert_eq!(level.column("A").unwrap()[5], Some(32.0));

        let growth = evaluate(&ds, &MetricRequest::Growth { field: Field::TOTAL_CASES, window: 1 }, &locs).unwrap();
        assert!((growth.column("A").unwrap()[5].unwrap() - 1.0).abs() < 1e-12);

        let new_growth = evaluate(&ds, &MetricRequest::Growth { field: Field::NEW_CASES, window: 2 }, &locs).unwrap();
        assert!((new_growth.column("A").unwrap()[5].unwrap() - 1.0).abs() < 1e-12);

        let direct = cumulative_positive_test_rate(&ds, &locs).unwrap();
        let via = evaluate(&ds, &MetricRequest::CumulativePositiveTestRate, &locs).unwrap();
        assert_eq!(direct, via);

        let active = evaluate(&ds, &MetricRequest::ActiveConfirmedCases { per_capita: false }, &locs).unwrap();
        assert!(active.columns()[0].iter().all(Option::is_none));
    }

    #[test]
    fn growth_request_validates_window() {
        let ds = dataset();
        let err = evaluate(
            &ds,
            &MetricRequest::Growth { field: Field::TOTAL_CASES, window: 0 },
            &["A".to_string()],
        )
        .unwrap_err();
        assert_eq!(err, EngineError::InvalidWindow { window: 0, min: 1 });
    }
}

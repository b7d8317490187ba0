//! Composite estimators built on the growth-rate primitive.
//!
//! These are smoothing proxies, not epidemiological models: "active" cases
//! are a 14-day backward difference of the running total, and the positive
//! test rates are plain ratios of aligned counts.

use crate::align::{GapPolicy, difference};
use crate::dataset::CanonicalDataset;
use crate::domain::{AlignedMatrix, Field, MetricFamily};
use crate::error::EngineError;
use crate::math::checked_div;

use super::rate::growth_rate;

/// Days a confirmed case is assumed to stay active.
pub const ACTIVE_CASE_DAYS: usize = 14;

/// 14-day backward difference of total cases (optionally per million).
///
/// The per-million variant needs a population entry for every requested
/// location and fails with `MissingPopulation` otherwise.
pub fn active_confirmed_cases(
    dataset: &CanonicalDataset,
    locations: &[String],
    per_capita: bool,
) -> Result<AlignedMatrix, EngineError> {
    let totals = if per_capita {
        dataset.total_per_capita_by_location(MetricFamily::Cases, locations)?
    } else {
        dataset.var_by_location(Field::TOTAL_CASES, locations, None)?
    };
    difference(&totals, ACTIVE_CASE_DAYS)
}

/// Growth rate of the (absolute) active-case estimate.
pub fn active_growth_rate(
    dataset: &CanonicalDataset,
    window: usize,
    locations: &[String],
) -> Result<AlignedMatrix, EngineError> {
    EngineError::check_window(window, 1)?;
    let active = active_confirmed_cases(dataset, locations, false)?;
    growth_rate(&active, window)
}

/// `window`-day increase in cases over the `window`-day increase in tests.
pub fn positive_test_rate(
    dataset: &CanonicalDataset,
    window: usize,
    locations: &[String],
) -> Result<AlignedMatrix, EngineError> {
    EngineError::check_window(window, 1)?;
    let cases = dataset.var_by_location(Field::TOTAL_CASES, locations, None)?;
    let tests = dataset.var_by_location(Field::TOTAL_TESTS, locations, None)?;
    let cases = difference(&cases, window)?;
    let tests = difference(&tests, window)?;
    Ok(cases.combine(&tests, checked_div))
}

/// Total cases over total tests, with the tests series linearly interpolated.
pub fn cumulative_positive_test_rate(
    dataset: &CanonicalDataset,
    locations: &[String],
) -> Result<AlignedMatrix, EngineError> {
    let cases = dataset.var_by_location(Field::TOTAL_CASES, locations, None)?;
    let tests = dataset.var_by_location_with(Field::TOTAL_TESTS, locations, GapPolicy::Linear)?;
    Ok(cases.combine(&tests, checked_div))
}

/// Growth rate of [`cumulative_positive_test_rate`].
pub fn cumulative_positive_test_growth_rate(
    dataset: &CanonicalDataset,
    window: usize,
    locations: &[String],
) -> Result<AlignedMatrix, EngineError> {
    EngineError::check_window(window, 1)?;
    let rate = cumulative_positive_test_rate(dataset, locations)?;
    growth_rate(&rate, window)
}

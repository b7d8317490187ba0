//! Reporting utilities: latest-value rankings and formatted terminal output.

pub mod format;

pub use format::*;

use chrono::NaiveDate;

use crate::domain::AlignedMatrix;

/// A location's most recent defined value.
#[derive(Debug, Clone, PartialEq)]
pub struct LatestValue {
    pub location: String,
    pub date: NaiveDate,
    pub value: f64,
}

/// Latest defined value per location, highest first.
///
/// Locations with no defined value are left out.
pub fn rank_latest(matrix: &AlignedMatrix) -> Vec<LatestValue> {
    let mut out: Vec<LatestValue> = matrix
        .locations()
        .iter()
        .filter_map(|location| {
            let (date, value) = matrix.latest(location)?;
            Some(LatestValue {
                location: location.clone(),
                date,
                value,
            })
        })
        .collect();
    out.sort_by(|a, b| {
        b.value
            .partial_cmp(&a.value)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.location.cmp(&b.location))
    });
    out
}

//! Time-series alignment: sparse canonical records to a dense date × location matrix.
//!
//! Rows are every calendar day between the first and last date reported by
//! any requested location. Columns are the requested locations in request
//! order; a location with no records gets an all-missing column.
//!
//! Gaps are forward-filled by default. Linear interpolation is only used where
//! a caller asks for it explicitly (the positive-test-rate denominator).

pub mod gaps;
pub mod window;

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::domain::{AlignedMatrix, CanonicalTable, Field, PerCapitaUnit};
use crate::error::EngineError;
use crate::math::checked_div;
use crate::population::PopulationLookup;

pub use gaps::*;
pub use window::*;

/// Align `field` for `locations` with forward-fill.
pub fn align(table: &CanonicalTable, field: Field, locations: &[String]) -> Result<AlignedMatrix, EngineError> {
    align_with(table, field, locations, GapPolicy::ForwardFill)
}

/// Align a field given by name; fails with `UnknownVariable` for names outside
/// the canonical schema.
pub fn align_by_name(table: &CanonicalTable, variable: &str, locations: &[String]) -> Result<AlignedMatrix, EngineError> {
    let field: Field = variable.parse()?;
    align(table, field, locations)
}

/// Align `field` for `locations` with an explicit gap policy.
pub fn align_with(
    table: &CanonicalTable,
    field: Field,
    locations: &[String],
    policy: GapPolicy,
) -> Result<AlignedMatrix, EngineError> {
    let locations = dedup_locations(locations)?;
    table.require_field(field)?;

    let column_of: HashMap<&str, usize> = locations
        .iter()
        .enumerate()
        .map(|(idx, loc)| (loc.as_str(), idx))
        .collect();

    let selected: Vec<_> = table
        .records()
        .iter()
        .filter(|r| column_of.contains_key(r.location.as_str()))
        .collect();

    let (Some(start), Some(end)) = (
        selected.iter().map(|r| r.date).min(),
        selected.iter().map(|r| r.date).max(),
    ) else {
        let columns = vec![Vec::new(); locations.len()];
        return Ok(AlignedMatrix::from_columns(Vec::new(), locations, columns));
    };

    let dates = daily_index(start, end);
    let mut columns = vec![vec![None; dates.len()]; locations.len()];
    for record in selected {
        let row = (record.date - start).num_days() as usize;
        let col = column_of[record.location.as_str()];
        columns[col][row] = record.get(field);
    }

    for column in columns.iter_mut() {
        policy.apply(column);
    }

    debug!(
        field = %field,
        locations = locations.len(),
        rows = dates.len(),
        "aligned field"
    );

    Ok(AlignedMatrix::from_columns(dates, locations, columns))
}

/// Scale absolute counts to "per unit of population" for each location.
///
/// Fails with `MissingPopulation` for the first location the lookup does not know.
pub fn per_capita(
    matrix: &AlignedMatrix,
    population: &dyn PopulationLookup,
    unit: PerCapitaUnit,
) -> Result<AlignedMatrix, EngineError> {
    let mut columns = Vec::with_capacity(matrix.locations().len());
    for (location, column) in matrix.locations().iter().zip(matrix.columns()) {
        let people = population
            .population(location)
            .ok_or_else(|| EngineError::MissingPopulation(location.clone()))?;
        let units = people / unit.people();
        columns.push(column.iter().map(|v| checked_div(*v, Some(units))).collect());
    }
    Ok(AlignedMatrix::from_columns(
        matrix.dates().to_vec(),
        matrix.locations().to_vec(),
        columns,
    ))
}

/// Every calendar day from `start` to `end` inclusive.
pub fn daily_index(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start.iter_days().take_while(|d| *d <= end).collect()
}

fn dedup_locations(locations: &[String]) -> Result<Vec<String>, EngineError> {
    if locations.is_empty() {
        return Err(EngineError::EmptyLocations);
    }
    let mut out: Vec<String> = Vec::with_capacity(locations.len());
    for loc in locations {
        if !out.contains(loc) {
            out.push(loc.clone());
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CanonicalRecord;
    use crate::population::{PopulationEntry, PopulationTable};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 5, day).unwrap()
    }

    fn locs(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn table() -> CanonicalTable {
        CanonicalTable::new(vec![
            CanonicalRecord::new(d(1), "A").with(Field::TOTAL_CASES, 10.0),
            CanonicalRecord::new(d(3), "A").with(Field::TOTAL_CASES, 30.0),
            CanonicalRecord::new(d(2), "B").with(Field::TOTAL_CASES, 5.0),
            CanonicalRecord::new(d(4), "B").with(Field::TOTAL_TESTS, 100.0),
            CanonicalRecord::new(d(9), "C").with(Field::TOTAL_CASES, 1.0),
        ])
    }

    #[test]
    fn align_builds_daily_rows_and_forward_fills() {
        let m = align(&table(), Field::TOTAL_CASES, &locs(&["A", "B", "Z"])).unwrap();

        assert_eq!(m.dates(), &[d(1), d(2), d(3), d(4)]);
        assert_eq!(m.locations(), &locs(&["A", "B", "Z"])[..]);
        assert_eq!(m.column("A").unwrap(), &[Some(10.0), Some(10.0), Some(30.0), Some(30.0)]);
        assert_eq!(m.column("B").unwrap(), &[None, Some(5.0), Some(5.0), Some(5.0)]);
        assert_eq!(m.column("Z").unwrap(), &[None, None, None, None]);
    }

    #[test]
    fn align_does_not_touch_the_source() {
        let t = table();
        let before = t.clone();
        let _ = align(&t, Field::TOTAL_CASES, &locs(&["A"])).unwrap();
        assert_eq!(t, before);
    }

    #[test]
    fn align_rejects_fields_outside_schema() {
        let err = align(&table(), Field::NEW_DEATHS, &locs(&["A"])).unwrap_err();
        assert_eq!(err, EngineError::UnknownVariable("new_deaths".to_string()));

        let err = align_by_name(&table(), "r_number", &locs(&["A"])).unwrap_err();
        assert_eq!(err, EngineError::UnknownVariable("r_number".to_string()));
    }

    #[test]
    fn align_requires_locations() {
        assert_eq!(
            align(&table(), Field::TOTAL_CASES, &[]).unwrap_err(),
            EngineError::EmptyLocations
        );
    }

    #[test]
    fn align_without_matching_records_is_empty_but_shaped() {
        let m = align(&table(), Field::TOTAL_CASES, &locs(&["Z"])).unwrap();
        assert!(m.is_empty());
        assert_eq!(m.locations(), &locs(&["Z"])[..]);
    }

    #[test]
    fn linear_policy_interpolates() {
        let m = align_with(&table(), Field::TOTAL_CASES, &locs(&["A"]), GapPolicy::Linear).unwrap();
        assert_eq!(m.column("A").unwrap(), &[Some(10.0), Some(20.0), Some(30.0)]);
    }

    #[test]
    fn per_capita_scales_and_reports_missing_population() {
        let m = align(&table(), Field::TOTAL_CASES, &locs(&["A", "B"])).unwrap();
        let population = PopulationTable::new([PopulationEntry {
            location: "A".to_string(),
            population: 2_000_000.0,
            population_density: None,
            year: None,
        }]);

        let err = per_capita(&m, &population, PerCapitaUnit::Million).unwrap_err();
        assert_eq!(err, EngineError::MissingPopulation("B".to_string()));

        let only_a = align(&table(), Field::TOTAL_CASES, &locs(&["A"])).unwrap();
        let pc = per_capita(&only_a, &population, PerCapitaUnit::Million).unwrap();
        assert_eq!(pc.column("A").unwrap(), &[Some(5.0), Some(5.0), Some(15.0)]);
    }
}

//! Derived metrics: incremental ("new") and per-capita columns.
//!
//! Sources differ in what they publish. Some give daily counts, some only
//! running totals; some give per-capita rates, some do not. Derivation fills
//! in whatever the canonical schema is missing, and only that: a column that
//! is already part of the table's schema is never recomputed, which makes
//! [`ensure_incremental`] idempotent.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::align::{align, backward_difference};
use crate::domain::{CanonicalTable, Field, Measure, MetricFamily, Scale};
use crate::math::checked_div;
use crate::population::PopulationLookup;

/// Fill in the incremental and per-capita columns for every family.
pub fn ensure_all_incremental(mut table: CanonicalTable, population: Option<&dyn PopulationLookup>) -> CanonicalTable {
    for family in MetricFamily::ALL {
        table = ensure_incremental(table, family, population);
    }
    table
}

/// Fill in `new_<family>`, `total_<family>_per_<unit>` and
/// `new_<family>_per_<unit>` when absent.
///
/// - `new_*` is the first difference of the forward-filled total on a daily
///   grid. Negative differences (source revisions) are kept as reported.
/// - `total_*_per_<unit>` needs a population lookup; locations the lookup does
///   not know get no value.
/// - `new_*_per_<unit>` is the first difference of the per-capita total.
pub fn ensure_incremental(
    mut table: CanonicalTable,
    family: MetricFamily,
    population: Option<&dyn PopulationLookup>,
) -> CanonicalTable {
    let total = Field::total(family, Scale::Absolute);
    let total_pc = Field::total(family, Scale::PerCapita);

    if table.has_field(total) && !table.has_field(total.with_measure(Measure::New)) {
        difference_into(&mut table, total);
    }

    if !table.has_field(total_pc) && table.has_field(total) {
        if let Some(population) = population {
            total_per_capita(&mut table, family, population);
        }
    }

    let new_pc = Field::incremental(family, Scale::PerCapita);
    if table.has_field(total_pc) && !table.has_field(new_pc) {
        difference_into(&mut table, total_pc);
    }

    table
}

/// Write `total_<family>_per_<unit>` from the absolute total and the lookup.
pub fn total_per_capita(table: &mut CanonicalTable, family: MetricFamily, population: &dyn PopulationLookup) {
    let total = Field::total(family, Scale::Absolute);
    let target = Field::total(family, Scale::PerCapita);
    let unit = family.per_capita_unit();

    let mut missing = 0usize;
    for record in table.records_mut() {
        let units = population.population(&record.location).map(|p| p / unit.people());
        if units.is_none() {
            missing += 1;
        }
        let value = checked_div(record.get(total), units);
        record.set(target, value);
    }
    table.add_to_schema(target);

    info!(field = %target, records_without_population = missing, "derived per-capita total");
}

/// Write the first difference of `source` (a total) into its `new_*` column.
fn difference_into(table: &mut CanonicalTable, source: Field) {
    let target = source.with_measure(Measure::New);
    let locations = table.locations();
    if locations.is_empty() {
        table.add_to_schema(target);
        return;
    }

    // Leading gaps count as zero so a location's first report differences
    // against nothing-reported-yet.
    let matrix = match align(table, source, &locations) {
        Ok(matrix) => matrix,
        Err(err) => {
            warn!(source = %source, error = %err, "cannot align total; incremental column not derived");
            return;
        }
    };
    let diffs: HashMap<&str, Vec<Option<f64>>> = matrix
        .locations()
        .iter()
        .zip(matrix.columns())
        .map(|(location, column)| {
            if column.iter().all(Option::is_none) {
                return (location.as_str(), vec![None; column.len()]);
            }
            let filled: Vec<Option<f64>> = column.iter().map(|v| Some(v.unwrap_or(0.0))).collect();
            (location.as_str(), backward_difference(&filled, 1))
        })
        .collect();

    let start = matrix.dates().first().copied();
    for record in table.records_mut() {
        let value = start.and_then(|start| {
            let row = (record.date - start).num_days() as usize;
            diffs.get(record.location.as_str())?.get(row).copied().flatten()
        });
        record.set(target, value);
    }
    table.add_to_schema(target);

    debug!(source = %source, target = %target, "derived incremental column");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CanonicalRecord;
    use crate::population::{PopulationEntry, PopulationTable};
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 6, day).unwrap()
    }

    fn table() -> CanonicalTable {
        CanonicalTable::new(vec![
            CanonicalRecord::new(d(1), "A").with(Field::TOTAL_CASES, 100.0),
            CanonicalRecord::new(d(2), "A").with(Field::TOTAL_CASES, 120.0),
            CanonicalRecord::new(d(4), "A").with(Field::TOTAL_CASES, 115.0),
            CanonicalRecord::new(d(2), "B").with(Field::TOTAL_CASES, 7.0),
            CanonicalRecord::new(d(3), "B").with(Field::TOTAL_CASES, 9.0),
        ])
    }

    fn population() -> PopulationTable {
        PopulationTable::new([PopulationEntry {
            location: "A".to_string(),
            population: 500_000.0,
            population_density: None,
            year: None,
        }])
    }

    fn value(table: &CanonicalTable, day: u32, loc: &str, field: Field) -> Option<f64> {
        table
            .records()
            .iter()
            .find(|r| r.date == d(day) && r.location == loc)
            .and_then(|r| r.get(field))
    }

    #[test]
    fn new_cases_are_first_differences_between_reports() {
        let out = ensure_incremental(table(), MetricFamily::Cases, None);

        assert!(out.has_field(Field::NEW_CASES));
        assert_eq!(value(&out, 1, "A", Field::NEW_CASES), None);
        assert_eq!(value(&out, 2, "A", Field::NEW_CASES), Some(20.0));
        // Revision downwards is preserved, and the day-3 gap was carried forward.
        assert_eq!(value(&out, 4, "A", Field::NEW_CASES), Some(-5.0));
        // B's first report differences against "nothing reported yet".
        assert_eq!(value(&out, 2, "B", Field::NEW_CASES), Some(7.0));
        assert_eq!(value(&out, 3, "B", Field::NEW_CASES), Some(2.0));
    }

    #[test]
    fn per_capita_columns_use_the_lookup() {
        let population = population();
        let out = ensure_incremental(table(), MetricFamily::Cases, Some(&population));

        let pc = Field::TOTAL_CASES_PER_MILLION;
        let new_pc = Field::incremental(MetricFamily::Cases, Scale::PerCapita);
        assert!(out.has_field(pc));
        assert!(out.has_field(new_pc));
        assert_eq!(value(&out, 1, "A", pc), Some(200.0));
        assert_eq!(value(&out, 2, "A", new_pc), Some(40.0));
        assert_eq!(value(&out, 2, "B", pc), None);
        assert_eq!(value(&out, 3, "B", new_pc), None);
    }

    #[test]
    fn ensure_incremental_is_idempotent() {
        let population = population();
        let once = ensure_all_incremental(table(), Some(&population));
        let twice = ensure_all_incremental(once.clone(), Some(&population));
        assert_eq!(once, twice);
    }

    #[test]
    fn existing_incremental_columns_are_left_alone() {
        let t = CanonicalTable::new(vec![
            CanonicalRecord::new(d(1), "A")
                .with(Field::TOTAL_CASES, 100.0)
                .with(Field::NEW_CASES, 3.0),
            CanonicalRecord::new(d(2), "A")
                .with(Field::TOTAL_CASES, 110.0)
                .with(Field::NEW_CASES, 10.0),
        ]);
        let out = ensure_incremental(t.clone(), MetricFamily::Cases, None);
        assert_eq!(out, t);
    }

    #[test]
    fn families_without_totals_are_skipped() {
        let out = ensure_incremental(table(), MetricFamily::Tests, None);
        assert!(!out.has_field(Field::NEW_TESTS));
    }

    #[test]
    fn differencing_a_missing_total_leaves_the_table_untouched() {
        let mut t = table();
        difference_into(&mut t, Field::TOTAL_TESTS);
        assert_eq!(t, table());
        assert!(!t.has_field(Field::NEW_TESTS));
    }
}

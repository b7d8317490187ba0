//! The canonical dataset for one source.
//!
//! Built once at ingestion time: the table is augmented with every derivable
//! incremental / per-capita column and then only read. The populations the
//! lookup knows for the dataset's locations are captured at the same time, so
//! explicit per-capita requests can fail with `MissingPopulation`.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::info;

use crate::align::{GapPolicy, align, align_with, moving_average, per_capita};
use crate::derive::ensure_all_incremental;
use crate::domain::{AlignedMatrix, CanonicalRecord, CanonicalTable, Field, MetricFamily, Scale};
use crate::error::EngineError;
use crate::population::PopulationLookup;

#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalDataset {
    table: CanonicalTable,
    populations: BTreeMap<String, (f64, Option<f64>)>,
}

impl CanonicalDataset {
    /// Take ownership of a canonical table and derive missing columns.
    pub fn new(table: CanonicalTable, population: Option<&dyn PopulationLookup>) -> Self {
        let before = table.schema().len();
        let table = ensure_all_incremental(table, population);
        let populations: BTreeMap<String, (f64, Option<f64>)> = population
            .map(|lookup| {
                table
                    .locations()
                    .into_iter()
                    .filter_map(|loc| {
                        let people = lookup.population(&loc)?;
                        let density = lookup.density(&loc);
                        Some((loc, (people, density)))
                    })
                    .collect()
            })
            .unwrap_or_default();
        info!(
            records = table.len(),
            locations = table.locations().len(),
            derived_columns = table.schema().len() - before,
            with_population = populations.len(),
            "canonical dataset ready"
        );
        Self { table, populations }
    }

    pub fn table(&self) -> &CanonicalTable {
        &self.table
    }

    /// Latest date present in the dataset.
    pub fn current_date(&self) -> Option<NaiveDate> {
        self.table.max_date()
    }

    pub fn locations(&self) -> Vec<String> {
        self.table.locations()
    }

    /// All records of one location, in date order.
    pub fn location_records(&self, location: &str) -> Vec<&CanonicalRecord> {
        self.table
            .records()
            .iter()
            .filter(|r| r.location == location)
            .collect()
    }

    /// Aligned date × location matrix of `field`, optionally smoothed.
    pub fn var_by_location(
        &self,
        field: Field,
        locations: &[String],
        ma_window: Option<usize>,
    ) -> Result<AlignedMatrix, EngineError> {
        let matrix = align(&self.table, field, locations)?;
        match ma_window {
            Some(window) => moving_average(&matrix, window),
            None => Ok(matrix),
        }
    }

    /// Aligned cumulative total of `family` per capita of the family's unit.
    ///
    /// Fails with `MissingPopulation` for the first requested location without
    /// a population entry, including every location when no lookup was given.
    pub fn total_per_capita_by_location(
        &self,
        family: MetricFamily,
        locations: &[String],
    ) -> Result<AlignedMatrix, EngineError> {
        let totals = self.var_by_location(Field::total(family, Scale::Absolute), locations, None)?;
        per_capita(&totals, self, family.per_capita_unit())
    }

    /// Aligned matrix with an explicit gap policy.
    pub fn var_by_location_with(
        &self,
        field: Field,
        locations: &[String],
        policy: GapPolicy,
    ) -> Result<AlignedMatrix, EngineError> {
        align_with(&self.table, field, locations, policy)
    }
}

impl PopulationLookup for CanonicalDataset {
    fn population(&self, location: &str) -> Option<f64> {
        self.populations.get(location).map(|(people, _)| *people)
    }

    fn density(&self, location: &str) -> Option<f64> {
        self.populations.get(location).and_then(|(_, density)| *density)
    }
}

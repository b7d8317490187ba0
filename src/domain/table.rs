//! Canonical records: one row per `(date, location)`.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use tracing::warn;

use crate::domain::types::{Field, TestUnits};
use crate::error::EngineError;

/// Name of the categorical test-unit variable in long-format inputs.
pub const TESTS_UNITS: &str = "tests_units";

/// Value carried by a long-format observation.
#[derive(Debug, Clone, PartialEq)]
pub enum ObservationValue {
    Number(f64),
    Label(String),
}

/// One long-format row: `{date, location, variable_name, value}`.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub date: NaiveDate,
    pub location: String,
    pub variable: String,
    pub value: ObservationValue,
}

/// A row keyed by `(date, location)` with the canonical numeric fields it carries.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRecord {
    pub date: NaiveDate,
    pub location: String,
    pub values: BTreeMap<Field, f64>,
    pub tests_units: Option<TestUnits>,
}

impl CanonicalRecord {
    pub fn new(date: NaiveDate, location: impl Into<String>) -> Self {
        Self {
            date,
            location: location.into(),
            values: BTreeMap::new(),
            tests_units: None,
        }
    }

    /// Builder-style setter; non-finite values are not stored.
    pub fn with(mut self, field: Field, value: f64) -> Self {
        self.set(field, Some(value));
        self
    }

    pub fn get(&self, field: Field) -> Option<f64> {
        self.values.get(&field).copied()
    }

    pub fn set(&mut self, field: Field, value: Option<f64>) {
        match value.filter(|v| v.is_finite()) {
            Some(v) => {
                self.values.insert(field, v);
            }
            None => {
                self.values.remove(&field);
            }
        }
    }
}

/// The canonical table for one source plus its schema.
///
/// The schema is the set of fields that are *columns* of the table, whether or
/// not every record has a value for them. Derived columns are added to the
/// schema when they are computed, which is what makes derivation idempotent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanonicalTable {
    records: Vec<CanonicalRecord>,
    schema: BTreeSet<Field>,
}

impl CanonicalTable {
    /// Build a table from records; the schema is every field any record carries.
    ///
    /// Records are kept sorted by `(date, location)`. If the same key appears
    /// more than once the later record wins.
    pub fn new(records: Vec<CanonicalRecord>) -> Self {
        let schema = records
            .iter()
            .flat_map(|r| r.values.keys().copied())
            .collect();
        Self::with_schema(records, schema)
    }

    /// Build a table with an explicit schema (columns that may be all-missing).
    pub fn with_schema(records: Vec<CanonicalRecord>, schema: BTreeSet<Field>) -> Self {
        let mut by_key: BTreeMap<(NaiveDate, String), CanonicalRecord> = BTreeMap::new();
        for record in records {
            let key = (record.date, record.location.clone());
            if by_key.insert(key, record).is_some() {
                warn!("duplicate canonical record replaced");
            }
        }
        Self {
            records: by_key.into_values().collect(),
            schema,
        }
    }

    /// Pivot long-format observations into canonical records.
    ///
    /// Fails with `UnknownVariable` on a numeric variable outside the schema.
    pub fn from_observations(observations: &[Observation]) -> Result<Self, EngineError> {
        let mut rows: BTreeMap<(NaiveDate, String), CanonicalRecord> = BTreeMap::new();
        let mut schema = BTreeSet::new();

        for obs in observations {
            let record = rows
                .entry((obs.date, obs.location.clone()))
                .or_insert_with(|| CanonicalRecord::new(obs.date, obs.location.clone()));

            if obs.variable.trim().eq_ignore_ascii_case(TESTS_UNITS) {
                let label = match &obs.value {
                    ObservationValue::Label(label) => label.clone(),
                    ObservationValue::Number(v) => v.to_string(),
                };
                record.tests_units = TestUnits::parse(&label);
                continue;
            }

            let field: Field = obs.variable.parse()?;
            schema.insert(field);
            let value = match &obs.value {
                ObservationValue::Number(v) => Some(*v),
                ObservationValue::Label(label) => label.trim().parse::<f64>().ok(),
            }
            .filter(|v| v.is_finite());
            let duplicate = record.values.contains_key(&field);
            let Some(value) = value else {
                if duplicate {
                    warn!(
                        date = %obs.date,
                        location = %obs.location,
                        variable = %field,
                        "duplicate observation without a numeric value ignored"
                    );
                }
                continue;
            };
            if duplicate {
                warn!(
                    date = %obs.date,
                    location = %obs.location,
                    variable = %field,
                    "duplicate observation, keeping the last value"
                );
            }
            record.set(field, Some(value));
        }

        Ok(Self {
            records: rows.into_values().collect(),
            schema,
        })
    }

    pub fn records(&self) -> &[CanonicalRecord] {
        &self.records
    }

    /// Mutable access for in-crate derivation; keys must not change.
    pub(crate) fn records_mut(&mut self) -> &mut [CanonicalRecord] {
        &mut self.records
    }

    pub fn schema(&self) -> &BTreeSet<Field> {
        &self.schema
    }

    pub fn has_field(&self, field: Field) -> bool {
        self.schema.contains(&field)
    }

    /// Mark a field as a column of the table.
    pub fn add_to_schema(&mut self, field: Field) {
        self.schema.insert(field);
    }

    /// Fail with `UnknownVariable` unless `field` is a column of this table.
    pub fn require_field(&self, field: Field) -> Result<(), EngineError> {
        if self.has_field(field) {
            Ok(())
        } else {
            Err(EngineError::UnknownVariable(field.name()))
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Distinct locations, sorted.
    pub fn locations(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self.records.iter().map(|r| r.location.as_str()).collect();
        set.into_iter().map(str::to_string).collect()
    }

    pub fn max_date(&self) -> Option<NaiveDate> {
        self.records.iter().map(|r| r.date).max()
    }
}

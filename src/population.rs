//! Population lookup.
//!
//! Per-capita normalisation needs a population per location. The engine never
//! reaches for a global table; callers pass anything implementing
//! [`PopulationLookup`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Population (and density) by location.
pub trait PopulationLookup {
    /// Resident population, if known and positive.
    fn population(&self, location: &str) -> Option<f64>;

    /// People per square kilometre, if known.
    fn density(&self, location: &str) -> Option<f64>;
}

/// One row of a population table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationEntry {
    pub location: String,
    pub population: f64,
    #[serde(default)]
    pub population_density: Option<f64>,
    #[serde(default)]
    pub year: Option<i32>,
}

/// In-memory population table keyed by location.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PopulationTable {
    entries: HashMap<String, PopulationEntry>,
}

impl PopulationTable {
    pub fn new(entries: impl IntoIterator<Item = PopulationEntry>) -> Self {
        let mut table = Self::default();
        for entry in entries {
            table.insert(entry);
        }
        table
    }

    pub fn insert(&mut self, entry: PopulationEntry) {
        self.entries.insert(entry.location.clone(), entry);
    }

    /// Merge another table into this one; entries from `other` win.
    pub fn update(&mut self, other: PopulationTable) {
        self.entries.extend(other.entries);
    }

    /// Entries sorted by location (stable output for exports).
    pub fn entries(&self) -> Vec<&PopulationEntry> {
        let mut entries: Vec<&PopulationEntry> = self.entries.values().collect();
        entries.sort_by(|a, b| a.location.cmp(&b.location));
        entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PopulationLookup for PopulationTable {
    fn population(&self, location: &str) -> Option<f64> {
        self.entries
            .get(location)
            .map(|e| e.population)
            .filter(|p| p.is_finite() && *p > 0.0)
    }

    fn density(&self, location: &str) -> Option<f64> {
        self.entries
            .get(location)
            .and_then(|e| e.population_density)
            .filter(|d| d.is_finite())
    }
}

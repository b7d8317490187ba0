//! Population table CSV read/write.
//!
//! Columns: `location,population[,population_density][,year]`.

use std::fs::File;
use std::path::Path;

use tracing::{info, warn};

use crate::error::AppError;
use crate::population::{PopulationEntry, PopulationTable};

/// Read a population CSV. Rows that fail to parse are skipped with a warning.
pub fn read_population_csv(path: &Path) -> Result<PopulationTable, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open population CSV '{}': {e}", path.display())))?;
    let table = read_population(file)?;
    info!(path = %path.display(), locations = table.len(), "loaded population table");
    Ok(table)
}

pub(crate) fn read_population<R: std::io::Read>(input: R) -> Result<PopulationTable, AppError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(input);

    let mut entries = Vec::new();
    for (idx, result) in reader.deserialize::<PopulationEntry>().enumerate() {
        match result {
            Ok(entry) => entries.push(entry),
            Err(e) => warn!(line = idx + 2, "skipping population row: {e}"),
        }
    }
    if entries.is_empty() {
        return Err(AppError::new(3, "Population CSV has no valid rows."));
    }
    Ok(PopulationTable::new(entries))
}

/// Write a population table, sorted by location.
pub fn write_population_csv(path: &Path, table: &PopulationTable) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::new(2, format!("Failed to create population CSV '{}': {e}", path.display())))?;
    for entry in table.entries() {
        writer
            .serialize(entry)
            .map_err(|e| AppError::new(2, format!("Failed to write population CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush population CSV: {e}")))?;
    Ok(())
}

//! Shared pipeline logic behind the `metric` and `fit` commands.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! CSV ingest -> population lookup -> canonical dataset -> metric / fit
//!
//! The command handlers can then focus on presentation and exports.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{info, warn};

use crate::dataset::CanonicalDataset;
use crate::domain::{AlignedMatrix, AnalyzeConfig, FitRunConfig, GrowthModel};
use crate::error::AppError;
use crate::fit::GeometricProcessFitter;
use crate::growth::evaluate;
use crate::io::ingest::{IngestedTable, load_canonical_table};
use crate::io::population::read_population_csv;
use crate::population::{PopulationLookup, PopulationTable};

/// Ingested input and the dataset built from it.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub ingest: IngestedTable,
    pub dataset: CanonicalDataset,
}

/// Outputs of an `epi metric` run.
#[derive(Debug, Clone)]
pub struct MetricOutput {
    pub data: LoadedData,
    pub matrix: AlignedMatrix,
}

/// Outputs of an `epi fit` run.
#[derive(Debug, Clone)]
pub struct FitOutput {
    pub data: LoadedData,
    pub levels: AlignedMatrix,
    pub models: BTreeMap<String, GrowthModel>,
}

/// Read the canonical CSV (and optional population CSV) and build the dataset.
pub fn load_dataset(input: &Path, population: Option<&Path>) -> Result<LoadedData, AppError> {
    let ingest = load_canonical_table(input)?;

    let population: Option<PopulationTable> = population.map(read_population_csv).transpose()?;
    let lookup = population.as_ref().map(|p| p as &dyn PopulationLookup);
    if lookup.is_none() {
        info!("no population table; per-capita columns are only those in the input");
    }

    let dataset = CanonicalDataset::new(ingest.table.clone(), lookup);
    Ok(LoadedData { ingest, dataset })
}

pub fn run_metric(config: &AnalyzeConfig) -> Result<MetricOutput, AppError> {
    let data = load_dataset(&config.input, config.population.as_deref())?;
    let matrix = evaluate(&data.dataset, &config.request, &config.locations)?;
    warn_missing_locations(&matrix);

    info!(metric = %config.request.label(), rows = matrix.n_rows(), "computed metric");
    Ok(MetricOutput { data, matrix })
}

pub fn run_fit(config: &FitRunConfig) -> Result<FitOutput, AppError> {
    // Validate the window before touching any files.
    let fitter = GeometricProcessFitter::new(config.window)?;

    let data = load_dataset(&config.input, config.population.as_deref())?;
    let levels = data.dataset.var_by_location(config.field, &config.locations, None)?;
    warn_missing_locations(&levels);

    let models = fitter.fit_matrix(&levels);
    if models.values().all(GrowthModel::is_empty) {
        return Err(AppError::new(
            3,
            format!(
                "No date had enough positive `{}` values for a {}-day fit.",
                config.field, config.window
            ),
        ));
    }

    Ok(FitOutput { data, levels, models })
}

fn warn_missing_locations(matrix: &AlignedMatrix) {
    for (location, column) in matrix.locations().iter().zip(matrix.columns()) {
        if column.iter().all(Option::is_none) {
            warn!(location = %location, "no values for requested location");
        }
    }
}

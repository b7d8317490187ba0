//! Read/write fitted-model JSON files.
//!
//! Model JSON is the portable representation of a fit run: which field and
//! window were fitted, and the per-location [`GrowthModel`] tables including
//! their skipped-date diagnostics.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::GrowthModel;
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelFile {
    pub tool: String,
    pub field: String,
    pub window: usize,
    /// Latest date of the dataset the models were fitted on.
    pub current_date: Option<NaiveDate>,
    pub models: BTreeMap<String, GrowthModel>,
}

impl ModelFile {
    pub fn new(
        field: impl Into<String>,
        window: usize,
        current_date: Option<NaiveDate>,
        models: BTreeMap<String, GrowthModel>,
    ) -> Self {
        Self {
            tool: "epi".to_string(),
            field: field.into(),
            window,
            current_date,
            models,
        }
    }
}

/// Write a model JSON file.
pub fn write_model_json(path: &Path, model: &ModelFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create model JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, model)
        .map_err(|e| AppError::new(2, format!("Failed to write model JSON: {e}")))?;
    info!(path = %path.display(), locations = model.models.len(), "exported model JSON");
    Ok(())
}

/// Read a model JSON file.
pub fn read_model_json(path: &Path) -> Result<ModelFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open model JSON '{}': {e}", path.display())))?;
    let model: ModelFile =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid model JSON: {e}")))?;
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Series;
    use crate::fit::fit;

    #[test]
    fn model_json_survives_a_write_read_cycle() {
        let start = NaiveDate::from_ymd_opt(2020, 10, 1).unwrap();
        let series = Series::new(
            start.iter_days().take(5).collect(),
            vec![Some(1.0), Some(2.0), None, Some(8.0), Some(16.0)],
        );
        let model = fit(&series, 3).unwrap();
        let file = ModelFile::new("total_cases", 3, Some(start), BTreeMap::from([("A".to_string(), model)]));

        let path = std::env::temp_dir().join(format!("epi-model-{}.json", std::process::id()));
        write_model_json(&path, &file).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let back = read_model_json(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert!(text.contains("\"insufficient_history\""));
        assert_eq!(back.tool, "epi");
        assert_eq!(back.models["A"].rows.len(), file.models["A"].rows.len());
        assert_eq!(back.models["A"].skipped, file.models["A"].skipped);
    }

    #[test]
    fn invalid_json_is_exit_code_2() {
        let path = std::env::temp_dir().join(format!("epi-model-bad-{}.json", std::process::id()));
        std::fs::write(&path, "{not json").unwrap();
        let err = read_model_json(&path).unwrap_err();
        let _ = std::fs::remove_file(&path);
        assert_eq!(err.exit_code(), 2);
    }
}

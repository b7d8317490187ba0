//! CSV exports: aligned matrices, fitted models and canonical tables.
//!
//! The exports are meant to be easy to consume in spreadsheets, plotting
//! scripts or downstream tooling. Missing cells are written as empty fields.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use tracing::info;

use crate::domain::{AlignedMatrix, CanonicalTable, GrowthModel};
use crate::error::AppError;

/// Write a matrix as `date,<location>...`.
pub fn write_matrix_csv(path: &Path, matrix: &AlignedMatrix) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;

    let mut header = vec!["date".to_string()];
    header.extend(matrix.locations().iter().cloned());
    writer
        .write_record(&header)
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for (row, date) in matrix.dates().iter().enumerate() {
        let mut record = vec![date.to_string()];
        record.extend(matrix.columns().iter().map(|c| fmt_cell(c[row])));
        writer
            .write_record(&record)
            .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush export CSV: {e}")))?;

    info!(path = %path.display(), rows = matrix.n_rows(), "exported matrix");
    Ok(())
}

/// Write fitted models, one row per `(location, date)`.
pub fn write_models_csv(path: &Path, models: &BTreeMap<String, GrowthModel>) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;

    writeln!(
        file,
        "location,date,window,local_growth_rate,prior_process_load,predicted_log_value,actual_log_value,fit_residual,n_points"
    )
    .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    let mut rows = 0usize;
    for (location, model) in models {
        for r in &model.rows {
            writeln!(
                file,
                "{},{},{},{:.10},{:.10},{:.10},{},{:.10},{}",
                csv_escape(location),
                r.date,
                model.window,
                r.local_growth_rate,
                r.prior_process_load,
                r.predicted_log_value,
                r.actual_log_value.map(|v| format!("{v:.10}")).unwrap_or_default(),
                r.fit_residual,
                r.n_points,
            )
            .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
            rows += 1;
        }
    }

    info!(path = %path.display(), rows, "exported model rows");
    Ok(())
}

/// Write a canonical table in the wide layout `io::ingest` reads back.
pub fn write_canonical_csv(path: &Path, table: &CanonicalTable) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::new(2, format!("Failed to create CSV '{}': {e}", path.display())))?;

    let fields: Vec<_> = table.schema().iter().copied().collect();
    let with_units = table.records().iter().any(|r| r.tests_units.is_some());

    let mut header = vec!["date".to_string(), "location".to_string()];
    header.extend(fields.iter().map(|f| f.name()));
    if with_units {
        header.push(crate::domain::TESTS_UNITS.to_string());
    }
    writer
        .write_record(&header)
        .map_err(|e| AppError::new(2, format!("Failed to write CSV header: {e}")))?;

    for r in table.records() {
        let mut record = vec![r.date.to_string(), r.location.clone()];
        record.extend(fields.iter().map(|f| fmt_cell(r.get(*f))));
        if with_units {
            record.push(r.tests_units.as_ref().map(|u| u.label().to_string()).unwrap_or_default());
        }
        writer
            .write_record(&record)
            .map_err(|e| AppError::new(2, format!("Failed to write CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush CSV: {e}")))?;

    info!(path = %path.display(), records = table.len(), "wrote canonical table");
    Ok(())
}

fn fmt_cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn csv_escape(s: &str) -> String {
    if s.contains([',', '"', '\n']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CanonicalRecord, Field, GrowthModelRow, TestUnits};
    use crate::io::read_canonical_table;
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 9, day).unwrap()
    }

    fn temp(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("epi-export-{}-{name}", std::process::id()))
    }

    #[test]
    fn matrix_csv_leaves_missing_cells_empty() {
        let m = AlignedMatrix::from_columns(
            vec![d(1), d(2)],
            vec!["A".to_string(), "B, C".to_string()],
            vec![vec![Some(1.5), None], vec![None, Some(2.0)]],
        );
        let path = temp("matrix.csv");
        write_matrix_csv(&path, &m).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(text, "date,A,\"B, C\"\n2020-09-01,1.5,\n2020-09-02,,2\n");
    }

    #[test]
    fn model_csv_has_one_line_per_row() {
        let model = GrowthModel {
            window: 3,
            rows: vec![GrowthModelRow {
                date: d(3),
                local_growth_rate: 0.1,
                prior_process_load: 1.0,
                predicted_log_value: 1.2,
                actual_log_value: None,
                fit_residual: 0.0,
                n_points: 2,
            }],
            skipped: Vec::new(),
        };
        let models = BTreeMap::from([("A".to_string(), model)]);
        let path = temp("model.csv");
        write_models_csv(&path, &models).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("A,2020-09-03,3,0.1000000000,"));
        assert!(lines[1].contains(",,"));
    }

    #[test]
    fn canonical_csv_reads_back() {
        let mut first = CanonicalRecord::new(d(1), "A").with(Field::TOTAL_CASES, 4.0);
        first.tests_units = Some(TestUnits::Tests);
        let table = CanonicalTable::new(vec![
            first,
            CanonicalRecord::new(d(2), "A")
                .with(Field::TOTAL_CASES, 6.0)
                .with(Field::TOTAL_TESTS, 50.0),
        ]);
        let path = temp("canonical.csv");
        write_canonical_csv(&path, &table).unwrap();
        let back = read_canonical_table(std::fs::File::open(&path).unwrap()).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(back.table, table);
    }
}

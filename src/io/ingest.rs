//! CSV ingest and normalization.
//!
//! This module turns a canonical-schema CSV into a [`CanonicalTable`].
//! Two layouts are accepted:
//!
//! - **wide**: `date`, `location`, then any canonical field columns
//!   (`total_cases`, `new_tests_per_thousand`, ...) and optionally `tests_units`
//! - **long**: `date`, `location`, `variable`, `value`
//!
//! Design goals:
//! - **Strict schema** for required columns (clear errors + exit code 2)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **No derivation here**: incremental and per-capita columns are the
//!   dataset's job

use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use csv::StringRecord;
use tracing::{debug, info, warn};

use crate::domain::{CanonicalRecord, CanonicalTable, Field, Observation, ObservationValue, TESTS_UNITS, TestUnits};
use crate::error::AppError;

/// Which CSV shape the header describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvLayout {
    Wide,
    Long,
}

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub location: Option<String>,
    pub message: String,
}

/// Ingest output: the canonical table plus row accounting.
#[derive(Debug, Clone)]
pub struct IngestedTable {
    pub table: CanonicalTable,
    pub layout: CsvLayout,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
}

/// Load a canonical CSV from disk.
pub fn load_canonical_table(path: &Path) -> Result<IngestedTable, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    let ingested = read_canonical_table(file)?;

    info!(
        path = %path.display(),
        layout = ?ingested.layout,
        rows_read = ingested.rows_read,
        rows_used = ingested.rows_used,
        row_errors = ingested.row_errors.len(),
        "ingested canonical table"
    );
    for err in ingested.row_errors.iter().take(20) {
        warn!(line = err.line, location = err.location.as_deref().unwrap_or(""), "{}", err.message);
    }

    Ok(ingested)
}

/// Read a canonical CSV from any reader.
pub fn read_canonical_table<R: Read>(input: R) -> Result<IngestedTable, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    for required in ["date", "location"] {
        if !header_map.contains_key(required) {
            return Err(AppError::new(2, format!("Missing required column: `{required}`")));
        }
    }

    let layout = if header_map.contains_key("variable") && header_map.contains_key("value") {
        CsvLayout::Long
    } else {
        CsvLayout::Wide
    };

    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;
    let mut rows_used = 0usize;

    let table = match layout {
        CsvLayout::Wide => {
            let columns = resolve_field_columns(&headers)?;
            let mut records = Vec::new();
            for (idx, result) in reader.records().enumerate() {
                // +2: header line, and 1-based line numbers.
                let line = idx + 2;
                rows_read += 1;
                match result.map_err(|e| format!("CSV parse error: {e}")).and_then(|record| {
                    parse_wide_row(&record, &header_map, &columns)
                }) {
                    Ok(record) => records.push(record),
                    Err(message) => row_errors.push(RowError {
                        line,
                        location: None,
                        message,
                    }),
                }
            }
            rows_used = records.len();
            let schema: BTreeSet<Field> = columns.iter().map(|(_, f)| *f).collect();
            CanonicalTable::with_schema(records, schema)
        }
        CsvLayout::Long => {
            let mut observations = Vec::new();
            for (idx, result) in reader.records().enumerate() {
                let line = idx + 2;
                rows_read += 1;
                let record = match result {
                    Ok(r) => r,
                    Err(e) => {
                        row_errors.push(RowError {
                            line,
                            location: None,
                            message: format!("CSV parse error: {e}"),
                        });
                        continue;
                    }
                };
                match parse_long_row(&record, &header_map) {
                    Ok(obs) => {
                        rows_used += 1;
                        observations.push(obs);
                    }
                    Err(message) => row_errors.push(RowError {
                        line,
                        location: get_optional(&record, &header_map, "location").map(str::to_string),
                        message,
                    }),
                }
            }
            CanonicalTable::from_observations(&observations)?
        }
    };

    if rows_used == 0 || table.is_empty() {
        return Err(AppError::new(3, "No valid rows remain after ingest."));
    }

    Ok(IngestedTable {
        table,
        layout,
        row_errors,
        rows_read,
        rows_used,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

/// Canonical field columns of a wide header, by index.
fn resolve_field_columns(headers: &StringRecord) -> Result<Vec<(usize, Field)>, AppError> {
    let mut columns = Vec::new();
    for (idx, raw) in headers.iter().enumerate() {
        let name = normalize_header_name(raw);
        if matches!(name.as_str(), "date" | "location") || name == TESTS_UNITS {
            continue;
        }
        match name.parse::<Field>() {
            Ok(field) => columns.push((idx, field)),
            Err(_) => debug!(column = %name, "ignoring non-canonical column"),
        }
    }
    if columns.is_empty() {
        return Err(AppError::new(
            2,
            "No canonical field columns found (expected e.g. `total_cases`, `total_tests`).",
        ));
    }
    Ok(columns)
}

fn parse_wide_row(
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
    columns: &[(usize, Field)],
) -> Result<CanonicalRecord, String> {
    let date = parse_date(get_required(record, header_map, "date")?)?;
    let location = get_required(record, header_map, "location")?;

    let mut row = CanonicalRecord::new(date, location);
    for (idx, field) in columns {
        let cell = record.get(*idx).map(str::trim).filter(|s| !s.is_empty());
        row.set(*field, parse_opt_f64(cell, field.name().as_str())?);
    }
    row.tests_units = get_optional(record, header_map, TESTS_UNITS).and_then(TestUnits::parse);
    Ok(row)
}

fn parse_long_row(record: &StringRecord, header_map: &HashMap<String, usize>) -> Result<Observation, String> {
    let date = parse_date(get_required(record, header_map, "date")?)?;
    let location = get_required(record, header_map, "location")?.to_string();
    let variable = normalize_header_name(get_required(record, header_map, "variable")?);
    let raw = get_optional(record, header_map, "value").unwrap_or("");

    let value = if variable == TESTS_UNITS {
        ObservationValue::Label(raw.to_string())
    } else {
        let field: Field = variable.parse().map_err(|e| format!("{e}"))?;
        match parse_opt_f64(Some(raw).filter(|s| !s.is_empty()), &field.name())? {
            Some(v) => ObservationValue::Number(v),
            None => return Err(format!("Missing value for `{field}`")),
        }
    };

    Ok(Observation {
        date,
        location,
        variable,
        value,
    })
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Result<&'a str, String> {
    let idx = header_map
        .get(name)
        .ok_or_else(|| format!("Missing required column: `{name}`"))?;
    record
        .get(*idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}

fn get_optional<'a>(record: &'a StringRecord, header_map: &HashMap<String, usize>, name: &str) -> Option<&'a str> {
    let idx = header_map.get(name)?;
    record.get(*idx).map(str::trim).filter(|s| !s.is_empty())
}

pub(crate) fn parse_date(s: &str) -> Result<NaiveDate, String> {
    const FMTS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d"];
    for fmt in FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }
    Err(format!(
        "Invalid date '{s}'. Expected one of: YYYY-MM-DD, DD/MM/YYYY, DD-MM-YYYY, YYYY/MM/DD."
    ))
}

/// Empty cells are missing; text that is not a number is a row error.
fn parse_opt_f64(s: Option<&str>, column: &str) -> Result<Option<f64>, String> {
    let Some(s) = s else { return Ok(None) };
    let v = s
        .replace(',', "")
        .parse::<f64>()
        .map_err(|_| format!("Invalid number '{s}' in `{column}`"))?;
    Ok(if v.is_finite() { Some(v) } else { None })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn wide_csv_keeps_declared_columns_in_schema() {
        let csv = "\u{feff}Date,Location,total_cases,total_tests,tests_units,iso_code\n\
                   2020-04-01,Italy,100,,tests performed,ITA\n\
                   02/04/2020,Italy,120,1500,,ITA\n\
                   2020-04-03,,130,,,\n\
                   2020-04-03,Italy,abc,,,\n";
        let out = read_canonical_table(csv.as_bytes()).unwrap();

        assert_eq!(out.layout, CsvLayout::Wide);
        assert_eq!(out.rows_read, 4);
        assert_eq!(out.rows_used, 2);
        assert_eq!(out.row_errors.len(), 2);
        assert_eq!(out.row_errors[0].line, 4);
        assert!(out.row_errors[1].message.contains("total_cases"));

        let table = &out.table;
        assert!(table.has_field(Field::TOTAL_CASES));
        assert!(table.has_field(Field::TOTAL_TESTS));
        let first = &table.records()[0];
        assert_eq!(first.date, d(2020, 4, 1));
        assert_eq!(first.get(Field::TOTAL_TESTS), None);
        assert_eq!(first.tests_units, Some(TestUnits::Tests));
        assert_eq!(table.records()[1].get(Field::TOTAL_TESTS), Some(1500.0));
    }

    #[test]
    fn long_csv_pivots_observations() {
        let csv = "date,location,variable,value\n\
                   2020-05-01,A,total_cases,10\n\
                   2020-05-01,A,total_deaths,1\n\
                   2020-05-02,A,total_cases,12\n\
                   2020-05-02,A,tests_units,people tested\n\
                   2020-05-02,A,r_number,1.1\n";
        let out = read_canonical_table(csv.as_bytes()).unwrap();

        assert_eq!(out.layout, CsvLayout::Long);
        assert_eq!(out.rows_used, 4);
        assert_eq!(out.row_errors.len(), 1);
        assert_eq!(out.row_errors[0].location.as_deref(), Some("A"));

        let table = &out.table;
        assert_eq!(table.len(), 2);
        assert_eq!(table.records()[1].get(Field::TOTAL_CASES), Some(12.0));
        assert_eq!(table.records()[1].tests_units, Some(TestUnits::Persons));
        assert!(table.has_field(Field::TOTAL_DEATHS));
    }

    #[test]
    fn missing_required_columns_fail_with_exit_code_2() {
        let err = read_canonical_table("date,total_cases\n2020-01-01,1\n".as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 2);

        let err = read_canonical_table("date,location,iso_code\n2020-01-01,A,X\n".as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn no_usable_rows_is_exit_code_3() {
        let err = read_canonical_table("date,location,total_cases\nbad,A,1\n".as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn date_formats() {
        assert_eq!(parse_date("2021-12-31").unwrap(), d(2021, 12, 31));
        assert_eq!(parse_date("31/12/2021").unwrap(), d(2021, 12, 31));
        assert_eq!(parse_date("31-12-2021").unwrap(), d(2021, 12, 31));
        assert_eq!(parse_date("2021/12/31").unwrap(), d(2021, 12, 31));
        assert!(parse_date("12.31.2021").is_err());
    }
}

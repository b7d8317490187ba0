//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the engine stays free of presentation concerns
//! - output changes are localized

use std::collections::BTreeMap;

use crate::dataset::CanonicalDataset;
use crate::domain::{AlignedMatrix, Field, GrowthModel, MetricRequest, SkipReason};
use crate::growth::{DoublingBand, rate_to_doubling_days};
use crate::io::ingest::IngestedTable;

use super::rank_latest;

/// Header block: what was read and what the dataset holds.
pub fn format_dataset_summary(ingest: &IngestedTable, dataset: &CanonicalDataset) -> String {
    let mut out = String::new();

    out.push_str("=== epi - growth rate engine ===\n");
    out.push_str(&format!(
        "Input: {:?} layout | rows read={} used={} errors={}\n",
        ingest.layout,
        ingest.rows_read,
        ingest.rows_used,
        ingest.row_errors.len()
    ));
    out.push_str(&format!(
        "Dataset: {} records | {} locations | latest date {}\n",
        dataset.table().len(),
        dataset.locations().len(),
        dataset
            .current_date()
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string())
    ));
    let fields: Vec<String> = dataset.table().schema().iter().map(|f| f.name()).collect();
    out.push_str(&format!("Fields: {}\n", fields.join(", ")));
    out.push('\n');

    out
}

/// Last `tail` rows of a metric matrix, plus a latest-value table.
pub fn format_metric(matrix: &AlignedMatrix, request: &MetricRequest, tail: usize) -> String {
    let mut out = String::new();
    let growth = request.is_growth();

    out.push_str(&format!("{}:\n", request.label()));
    out.push_str(&format_matrix_tail(matrix, tail, growth));
    out.push('\n');

    out.push_str("Latest:\n");
    let ranked = rank_latest(matrix);
    if ranked.is_empty() {
        out.push_str("  (no defined values)\n");
    }
    for row in ranked {
        let value = if growth { fmt_pct(row.value) } else { fmt_value(row.value) };
        out.push_str(&format!("  {:<20} {}  {:>12}", row.location, row.date, value));
        if growth {
            out.push_str(&format!("  {}", fmt_doubling(row.value)));
        }
        out.push('\n');
    }

    out
}

/// Date-by-location table of the last `tail` rows.
pub fn format_matrix_tail(matrix: &AlignedMatrix, tail: usize, as_percent: bool) -> String {
    let view = matrix.tail(tail);
    let mut out = String::new();

    out.push_str(&format!("{:<10}", "date"));
    for location in view.locations() {
        out.push_str(&format!(" {:>14}", truncate(location, 14)));
    }
    out.push('\n');

    for (row, date) in view.dates().iter().enumerate() {
        out.push_str(&date.to_string());
        for column in view.columns() {
            let cell = match column[row] {
                Some(v) if as_percent => fmt_pct(v),
                Some(v) => fmt_value(v),
                None => "-".to_string(),
            };
            out.push_str(&format!(" {cell:>14}"));
        }
        out.push('\n');
    }

    out
}

/// Last `tail` fitted rows per location, with skip counts.
pub fn format_model_summary(models: &BTreeMap<String, GrowthModel>, field: Field, tail: usize) -> String {
    let mut out = String::new();

    for (location, model) in models {
        let history = count_skips(model, SkipReason::InsufficientHistory);
        let points = count_skips(model, SkipReason::InsufficientPoints);
        out.push_str(&format!(
            "{location} | {field} | window={} | fitted={} skipped: history={history} points={points}\n",
            model.window,
            model.len()
        ));
        if model.is_empty() {
            out.push_str("  (no model)\n\n");
            continue;
        }

        out.push_str(&format!(
            "  {:<10} {:>9} {:>10} {:>11} {:>11} {:>10} {:>3}  {}\n",
            "date", "R/day", "P", "pred ln", "actual ln", "SSE", "n", "doubling"
        ));
        let start = model.rows.len().saturating_sub(tail);
        for r in &model.rows[start..] {
            // R is a log rate; the doubling time wants the simple rate.
            let simple = r.local_growth_rate.exp_m1();
            out.push_str(&format!(
                "  {:<10} {:>9.4} {:>10.4} {:>11.4} {:>11} {:>10.2e} {:>3}  {}\n",
                r.date.to_string(),
                r.local_growth_rate,
                r.prior_process_load,
                r.predicted_log_value,
                r.actual_log_value.map(|v| format!("{v:.4}")).unwrap_or_else(|| "-".to_string()),
                r.fit_residual,
                r.n_points,
                fmt_doubling(simple),
            ));
        }
        out.push('\n');
    }

    out
}

/// `"doubling 6.6d (rapid)"`, `"halving 12.0d (shrinking)"` or `"flat"`.
pub fn fmt_doubling(rate: f64) -> String {
    let band = DoublingBand::classify(rate);
    match rate_to_doubling_days(rate) {
        Some(days) if days > 0.0 => format!("doubling {days:.1}d ({band})"),
        Some(days) => format!("halving {:.1}d ({band})", -days),
        None => band.to_string(),
    }
}

fn count_skips(model: &GrowthModel, reason: SkipReason) -> usize {
    model.skipped.iter().filter(|s| s.reason == reason).count()
}

fn fmt_pct(v: f64) -> String {
    format!("{:.2}%", v * 100.0)
}

fn fmt_value(v: f64) -> String {
    if v.abs() >= 1000.0 || v == v.trunc() {
        format!("{v:.0}")
    } else {
        format!("{v:.4}")
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GrowthModelRow, SkippedDate};
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 6, day).unwrap()
    }

    #[test]
    fn matrix_tail_shows_missing_as_dash() {
        let m = AlignedMatrix::from_columns(
            vec![d(1), d(2), d(3)],
            vec!["A".to_string()],
            vec![vec![Some(0.5), None, Some(0.25)]],
        );
        let text = format_matrix_tail(&m, 2, true);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("2020-06-02") && lines[1].trim_end().ends_with('-'));
        assert!(lines[2].ends_with("25.00%"));
    }

    #[test]
    fn doubling_labels() {
        assert_eq!(fmt_doubling(1.0), "doubling 1.0d (rapid)");
        assert_eq!(fmt_doubling(0.0), "flat");
        assert!(fmt_doubling(-0.1).starts_with("halving 6.6d"));
    }

    #[test]
    fn model_summary_counts_skips() {
        let model = GrowthModel {
            window: 2,
            rows: vec![GrowthModelRow {
                date: d(2),
                local_growth_rate: 2f64.ln(),
                prior_process_load: 0.0,
                predicted_log_value: 2f64.ln(),
                actual_log_value: Some(2f64.ln()),
                fit_residual: 0.0,
                n_points: 2,
            }],
            skipped: vec![SkippedDate {
                date: d(1),
                reason: SkipReason::InsufficientHistory,
            }],
        };
        let models = BTreeMap::from([("A".to_string(), model)]);
        let text = format_model_summary(&models, Field::TOTAL_CASES, 5);
        assert!(text.contains("fitted=1 skipped: history=1 points=0"));
        assert!(text.contains("doubling 1.0d (rapid)"));
    }
}

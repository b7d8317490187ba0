//! Command-line parsing for the `epi` growth-rate engine.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the engine code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::domain::{Field, MetricRequest};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "epi", version, about = "Epidemic growth rates and local geometric-process fits")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compute a metric matrix (levels, growth rates, test rates) and print its tail.
    Metric(MetricArgs),
    /// Fit the local geometric-growth model per location.
    Fit(FitArgs),
    /// Write a deterministic synthetic canonical CSV.
    Sample(SampleArgs),
}

/// Selectable metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MetricKind {
    /// The field itself (optionally smoothed with `--ma-window`).
    Level,
    /// Average growth rate of `--field` over `--window` days.
    Growth,
    /// 14-day difference of total cases.
    Active,
    /// Growth rate of the active-case estimate.
    ActiveGrowth,
    /// Windowed positive test rate.
    PositiveRate,
    /// Total cases over interpolated total tests.
    CumPositiveRate,
    /// Growth rate of the cumulative positive test rate.
    CumPositiveGrowth,
}

/// Shared input options.
#[derive(Debug, Args, Clone)]
pub struct InputArgs {
    /// Canonical CSV (wide or long layout).
    #[arg(short = 'i', long, value_name = "CSV")]
    pub input: PathBuf,

    /// Population CSV (`location,population,...`). Falls back to `EPI_POPULATION_CSV`.
    #[arg(long, value_name = "CSV", env = "EPI_POPULATION_CSV")]
    pub population: Option<PathBuf>,

    /// Locations to include (repeatable).
    #[arg(short = 'l', long = "location", required = true, num_args = 1..)]
    pub locations: Vec<String>,

    /// Number of trailing dates to print.
    #[arg(long, default_value_t = 14)]
    pub tail: usize,

    /// Export the result matrix to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct MetricArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Which metric to compute.
    #[arg(short = 'm', long, value_enum, default_value_t = MetricKind::Growth)]
    pub metric: MetricKind,

    /// Canonical field for `level` and `growth` (e.g. `total_cases`, `new_deaths_per_million`).
    #[arg(short = 'f', long, default_value = "total_cases")]
    pub field: Field,

    /// Window (days) for growth and rate metrics.
    #[arg(short = 'w', long, default_value_t = 7)]
    pub window: usize,

    /// Trailing moving-average window for `level`.
    #[arg(long)]
    pub ma_window: Option<usize>,

    /// Use the per-million variant for `active`.
    #[arg(long)]
    pub per_capita: bool,
}

impl MetricArgs {
    /// The engine request this invocation names.
    pub fn request(&self) -> MetricRequest {
        let window = self.window;
        match self.metric {
            MetricKind::Level => MetricRequest::Level {
                field: self.field,
                ma_window: self.ma_window,
            },
            MetricKind::Growth => MetricRequest::Growth {
                field: self.field,
                window,
            },
            MetricKind::Active => MetricRequest::ActiveConfirmedCases {
                per_capita: self.per_capita,
            },
            MetricKind::ActiveGrowth => MetricRequest::ActiveGrowth { window },
            MetricKind::PositiveRate => MetricRequest::PositiveTestRate { window },
            MetricKind::CumPositiveRate => MetricRequest::CumulativePositiveTestRate,
            MetricKind::CumPositiveGrowth => MetricRequest::CumulativePositiveTestGrowth { window },
        }
    }
}

#[derive(Debug, Parser, Clone)]
pub struct FitArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Canonical field to fit.
    #[arg(short = 'f', long, default_value = "total_cases")]
    pub field: Field,

    /// Trailing window (calendar days, >= 2).
    #[arg(short = 'w', long, default_value_t = 7)]
    pub window: usize,

    /// Export the fitted models to JSON.
    #[arg(long = "export-model", value_name = "JSON")]
    pub export_model: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct SampleArgs {
    /// Output CSV path.
    #[arg(short = 'o', long, value_name = "CSV")]
    pub out: PathBuf,

    /// Locations to generate.
    #[arg(short = 'l', long = "location", num_args = 1.., default_values = ["Alpha", "Beta"])]
    pub locations: Vec<String>,

    /// First date (YYYY-MM-DD).
    #[arg(long, default_value = "2020-03-01")]
    pub start: chrono::NaiveDate,

    /// Number of days.
    #[arg(long, default_value_t = 90)]
    pub days: usize,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Log-normal noise on daily new cases.
    #[arg(long, default_value_t = 0.15)]
    pub noise: f64,
}

//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and installs logging
//! - parses CLI arguments into run configs
//! - runs the metric / fit pipelines
//! - prints reports and writes optional exports

use clap::Parser;
use tracing::debug;

use crate::cli::{Command, FitArgs, MetricArgs, SampleArgs};
use crate::domain::{AnalyzeConfig, FitRunConfig, SampleConfig};
use crate::error::AppError;
use crate::logging::{self, LogFormat};

pub mod pipeline;

/// Entry point for the `epi` binary.
pub fn run() -> Result<(), AppError> {
    // A missing .env is normal; the variables may come from the shell.
    let dotenv = dotenvy::dotenv();
    logging::init(LogFormat::from_env());
    if let Ok(path) = dotenv {
        debug!(path = %path.display(), "loaded .env");
    }

    let cli = crate::cli::Cli::parse();
    match cli.command {
        Command::Metric(args) => handle_metric(args),
        Command::Fit(args) => handle_fit(args),
        Command::Sample(args) => handle_sample(args),
    }
}

fn handle_metric(args: MetricArgs) -> Result<(), AppError> {
    let config = analyze_config_from_args(&args);
    let run = pipeline::run_metric(&config)?;

    println!(
        "{}",
        crate::report::format_dataset_summary(&run.data.ingest, &run.data.dataset)
    );
    println!("{}", crate::report::format_metric(&run.matrix, &config.request, config.tail));

    if let Some(path) = &config.export {
        crate::io::export::write_matrix_csv(path, &run.matrix)?;
    }
    Ok(())
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let config = fit_config_from_args(&args);
    let run = pipeline::run_fit(&config)?;

    println!(
        "{}",
        crate::report::format_dataset_summary(&run.data.ingest, &run.data.dataset)
    );
    println!(
        "{}",
        crate::report::format_model_summary(&run.models, config.field, config.tail)
    );

    if let Some(path) = &config.export {
        crate::io::export::write_models_csv(path, &run.models)?;
    }
    if let Some(path) = &config.export_model {
        let file = crate::io::model::ModelFile::new(
            config.field.name(),
            config.window,
            run.data.dataset.current_date(),
            run.models,
        );
        crate::io::model::write_model_json(path, &file)?;
    }
    Ok(())
}

fn handle_sample(args: SampleArgs) -> Result<(), AppError> {
    let config = sample_config_from_args(&args);
    let table = crate::data::generate_sample(&config)?;
    crate::io::export::write_canonical_csv(&args.out, &table)?;
    println!(
        "Wrote {} records for {} locations to {}",
        table.len(),
        config.locations.len(),
        args.out.display()
    );
    Ok(())
}

pub fn analyze_config_from_args(args: &MetricArgs) -> AnalyzeConfig {
    AnalyzeConfig {
        input: args.input.input.clone(),
        population: args.input.population.clone(),
        request: args.request(),
        locations: args.input.locations.clone(),
        tail: args.input.tail,
        export: args.input.export.clone(),
    }
}

pub fn fit_config_from_args(args: &FitArgs) -> FitRunConfig {
    FitRunConfig {
        input: args.input.input.clone(),
        population: args.input.population.clone(),
        field: args.field,
        window: args.window,
        locations: args.input.locations.clone(),
        tail: args.input.tail,
        export: args.input.export.clone(),
        export_model: args.export_model.clone(),
    }
}

pub fn sample_config_from_args(args: &SampleArgs) -> SampleConfig {
    SampleConfig {
        locations: args.locations.clone(),
        start: args.start,
        days: args.days,
        seed: args.seed,
        noise_sigma: args.noise,
    }
}

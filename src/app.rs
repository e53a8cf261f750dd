//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - installs the logger
//! - reads environment settings once
//! - runs the fit pipeline and prints the report

use clap::Parser;
use log::LevelFilter;

use crate::cli::{Command, DemoArgs, FitArgs, ModelArgs};
use crate::config::Settings;
use crate::domain::{Feature, FitConfig, RecordSource};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `lapfit` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();
    init_logging(cli.verbose);
    let settings = Settings::from_env();

    match cli.command {
        Command::Fit(args) => handle_fit(&fit_config_from_args(&args, &settings)?),
        Command::Demo(args) => handle_fit(&demo_config_from_args(&args, &settings)),
        Command::Features => {
            print!("{}", crate::report::format_feature_list());
            Ok(())
        }
    }
}

fn init_logging(verbose: u8) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    match verbose {
        0 => {}
        1 => {
            builder.filter_level(LevelFilter::Info);
        }
        _ => {
            builder.filter_level(LevelFilter::Debug);
        }
    }
    builder.format_timestamp(None);
    // A logger may already be installed when embedded (e.g. tests).
    let _ = builder.try_init();
}

fn handle_fit(config: &FitConfig) -> Result<(), AppError> {
    let run = pipeline::run(config)?;
    print!("{}", crate::report::format_run_summary(&run, config));

    if let Some(path) = &config.json_out {
        crate::io::report_file::write_fit_report(path, &crate::report::fit_report_file(&run, config))?;
        println!("Wrote fit report JSON: {}", path.display());
    }
    Ok(())
}

pub fn fit_config_from_args(args: &FitArgs, settings: &Settings) -> Result<FitConfig, AppError> {
    let csv = settings.resolve_csv(args.csv.clone())?;
    let mut config = base_config(&args.model, settings, RecordSource::Csv(csv));
    config.driver = args.driver.clone().or_else(|| settings.default_driver.clone());
    config.include_inaccurate = args.include_inaccurate;
    Ok(config)
}

pub fn demo_config_from_args(args: &DemoArgs, settings: &Settings) -> FitConfig {
    base_config(
        &args.model,
        settings,
        RecordSource::Synthetic {
            laps: args.laps,
            seed: args.seed,
        },
    )
}

fn base_config(model: &ModelArgs, settings: &Settings, source: RecordSource) -> FitConfig {
    // Flag, then LAPFIT_FEATURES, then the whole whitelist.
    let features = model
        .features
        .clone()
        .or_else(|| settings.default_features.clone())
        .unwrap_or_else(|| Feature::ALL.iter().map(|f| f.column_name().to_string()).collect());

    FitConfig {
        source,
        features,
        solver: model.solver,
        driver: None,
        include_inaccurate: false,
        show_laps: model.show_laps,
        show_artifacts: model.artifacts,
        json_out: model.json.clone(),
    }
}

//! Command-line parsing for the lap-time regression tool.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! numeric code; `app` turns parsed arguments into a `FitConfig`.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::domain::SolverChoice;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "lapfit",
    version,
    about = "Lap-time linear regression with Gram-Schmidt and Householder QR"
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). `RUST_LOG` also works.
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit lap times from a per-lap CSV export and print coefficients and diagnostics.
    Fit(FitArgs),
    /// Fit a generated stint (no input data needed).
    Demo(DemoArgs),
    /// List the predictors that can be requested with `--features`.
    Features,
}

/// Model and output options shared by `fit` and `demo`.
#[derive(Debug, Args, Clone)]
pub struct ModelArgs {
    /// Comma-separated predictors (default: LAPFIT_FEATURES, else all five).
    #[arg(short = 'f', long, value_delimiter = ',')]
    pub features: Option<Vec<String>>,

    /// QR strategy to use.
    #[arg(short = 's', long, value_enum, default_value_t = SolverChoice::Both)]
    pub solver: SolverChoice,

    /// Print actual vs predicted time for every lap.
    #[arg(long)]
    pub show_laps: bool,

    /// Print factorization artifacts (R, and beta for Householder).
    #[arg(long)]
    pub artifacts: bool,

    /// Also write the fit report (coefficients, quality, per-lap errors) as JSON.
    #[arg(long, value_name = "PATH")]
    pub json: Option<PathBuf>,
}

/// Options for fitting a CSV lap table.
#[derive(Debug, Args, Clone)]
pub struct FitArgs {
    /// Per-lap CSV (default: LAPFIT_CSV).
    #[arg(long, value_name = "CSV")]
    pub csv: Option<PathBuf>,

    /// Keep only this driver's laps (`Driver` column; default: LAPFIT_DRIVER).
    #[arg(short = 'd', long)]
    pub driver: Option<String>,

    /// Keep laps flagged `IsAccurate = false`.
    #[arg(long)]
    pub include_inaccurate: bool,

    #[command(flatten)]
    pub model: ModelArgs,
}

/// Options for the synthetic stint.
#[derive(Debug, Args, Clone)]
pub struct DemoArgs {
    /// Number of laps in the generated stint.
    #[arg(long, default_value_t = 40)]
    pub laps: usize,

    /// Random seed for the generated stint.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    #[command(flatten)]
    pub model: ModelArgs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fit_with_feature_list() {
        let cli = Cli::parse_from([
            "lapfit",
            "fit",
            "--csv",
            "laps.csv",
            "--features",
            "TyreLife,LapNumber",
            "--solver",
            "householder",
            "-d",
            "LEC",
        ]);
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        assert_eq!(args.csv, Some(PathBuf::from("laps.csv")));
        assert_eq!(
            args.model.features,
            Some(vec!["TyreLife".to_string(), "LapNumber".to_string()])
        );
        assert_eq!(args.model.solver, SolverChoice::Householder);
        assert_eq!(args.driver.as_deref(), Some("LEC"));
    }

    #[test]
    fn demo_defaults() {
        let cli = Cli::parse_from(["lapfit", "-vv", "demo"]);
        assert_eq!(cli.verbose, 2);
        let Command::Demo(args) = cli.command else {
            panic!("expected demo");
        };
        assert_eq!(args.laps, 40);
        assert_eq!(args.model.solver, SolverChoice::Both);
        assert!(args.model.features.is_none());
        assert!(args.model.json.is_none());
    }
}

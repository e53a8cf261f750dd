//! Reporting utilities: per-lap predictions, coefficient pairing, and formatted
//! terminal output.

use nalgebra::DVector;

use crate::app::pipeline::RunOutput;
use crate::domain::{Coefficient, DesignMatrix, FitConfig, FitReportFile, LapPrediction, RecordSource, StrategyReport};

pub mod format;

pub use format::*;

/// Predicted time and error for every row of the design matrix.
pub fn compute_predictions(design: &DesignMatrix, x: &DVector<f64>) -> Vec<LapPrediction> {
    let predicted = &design.a * x;
    design
        .b
        .iter()
        .zip(predicted.iter())
        .zip(&design.row_labels)
        .map(|((&actual, &predicted), &lap)| LapPrediction {
            lap,
            actual,
            predicted,
            error: actual - predicted,
        })
        .collect()
}

/// Pair coefficients with their feature names (1:1, intercept first).
pub fn pair_coefficients(names: &[String], x: &DVector<f64>) -> Vec<Coefficient> {
    names
        .iter()
        .zip(x.iter())
        .map(|(name, &value)| Coefficient {
            name: name.clone(),
            value,
        })
        .collect()
}

/// Snapshot of a run in its portable (JSON) form.
pub fn fit_report_file(run: &RunOutput, config: &FitConfig) -> FitReportFile {
    let source = match &config.source {
        RecordSource::Csv(path) => path.display().to_string(),
        RecordSource::Synthetic { laps, seed } => format!("synthetic:{laps}:{seed}"),
    };

    FitReportFile {
        tool: "lapfit".to_string(),
        source,
        driver: config.driver.as_ref().map(|d| d.to_uppercase()),
        solver: config.solver,
        feature_names: run.design.feature_names.clone(),
        laps: run.design.rows(),
        warnings: run.design.warnings.clone(),
        fits: run
            .fits
            .iter()
            .map(|fit| StrategyReport {
                strategy: fit.strategy,
                coefficients: fit.coefficients.clone(),
                quality: fit.quality,
                predictions: fit.predictions.clone(),
            })
            .collect(),
        failures: run
            .failures
            .iter()
            .map(|(strategy, err)| (*strategy, err.to_string()))
            .collect(),
        max_coefficient_gap: run.max_coefficient_gap(),
    }
}

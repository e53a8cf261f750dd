//! Read/write fit report JSON files.
//!
//! A fit report is the portable record of a run: inputs, warnings, and for
//! every strategy its coefficients, quality and per-lap errors. The schema is
//! `domain::FitReportFile`.

use std::fs::File;
use std::path::Path;

use crate::domain::FitReportFile;
use crate::error::{AppError, EXIT_INPUT};

/// Write a fit report as pretty-printed JSON.
pub fn write_fit_report(path: &Path, report: &FitReportFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(EXIT_INPUT, format!("Failed to create report JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, report)
        .map_err(|e| AppError::new(EXIT_INPUT, format!("Failed to write report JSON: {e}")))?;
    log::info!("wrote fit report to {}", path.display());
    Ok(())
}

/// Read a fit report written by [`write_fit_report`].
pub fn read_fit_report(path: &Path) -> Result<FitReportFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(EXIT_INPUT, format!("Failed to open report JSON '{}': {e}", path.display())))?;
    serde_json::from_reader(file).map_err(|e| AppError::new(EXIT_INPUT, format!("Invalid report JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Coefficient, FitQuality, LapPrediction, SolverChoice, Strategy, StrategyReport};

    fn report(condition_number: f64) -> FitReportFile {
        FitReportFile {
            tool: "lapfit".to_string(),
            source: "laps.csv".to_string(),
            driver: Some("VER".to_string()),
            solver: SolverChoice::Householder,
            feature_names: vec!["Intercept".to_string(), "TyreLife".to_string()],
            laps: 1,
            warnings: Vec::new(),
            fits: vec![StrategyReport {
                strategy: Strategy::Householder,
                coefficients: vec![
                    Coefficient {
                        name: "Intercept".to_string(),
                        value: 91.2,
                    },
                    Coefficient {
                        name: "TyreLife".to_string(),
                        value: 0.061,
                    },
                ],
                quality: FitQuality {
                    residual_norm: 0.4,
                    rmse: 0.2,
                    condition_number,
                },
                predictions: vec![LapPrediction {
                    lap: 3.0,
                    actual: 91.4,
                    predicted: 91.383,
                    error: 0.017,
                }],
            }],
            failures: vec![(Strategy::GramSchmidt, "rank deficient".to_string())],
            max_coefficient_gap: None,
        }
    }

    #[test]
    fn saved_report_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fit.json");
        let original = report(12.5);

        write_fit_report(&path, &original).unwrap();
        assert_eq!(read_fit_report(&path).unwrap(), original);

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"strategy\": \"householder\""));
        assert!(text.contains("\"solver\": \"householder\""));
    }

    #[test]
    fn infinite_condition_number_is_stored_as_null() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fit.json");

        write_fit_report(&path, &report(f64::INFINITY)).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"condition_number\": null"));

        let back = read_fit_report(&path).unwrap();
        assert!(back.fits[0].quality.condition_number.is_infinite());
    }

    #[test]
    fn malformed_report_is_an_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fit.json");
        std::fs::write(&path, "{\"tool\": 1}").unwrap();

        assert_eq!(read_fit_report(&path).unwrap_err().exit_code(), EXIT_INPUT);
        assert_eq!(
            read_fit_report(&dir.path().join("missing.json")).unwrap_err().exit_code(),
            EXIT_INPUT
        );
    }
}

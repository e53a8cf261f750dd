//! Shared "fit pipeline" logic used by every subcommand.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! record set -> design matrix -> solve (one or both strategies) -> metrics
//!
//! The app layer can then focus on presentation.

use rayon::prelude::*;

use crate::data::generate_stint;
use crate::domain::{Coefficient, DesignMatrix, FitConfig, FitQuality, LapPrediction, RecordSet, RecordSource, Strategy};
use crate::error::{AppError, FitError};
use crate::features::build_feature_matrix;
use crate::io::ingest::{IngestOptions, IngestedLaps, load_lap_records};
use crate::math::{Solution, metrics, solver_for};
use crate::report::{compute_predictions, pair_coefficients};

/// One strategy's fitted model and diagnostics.
#[derive(Debug, Clone)]
pub struct StrategyFit {
    pub strategy: Strategy,
    pub solution: Solution,
    pub coefficients: Vec<Coefficient>,
    pub quality: FitQuality,
    pub predictions: Vec<LapPrediction>,
}

/// All computed outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    /// Present when the records came from a CSV file.
    pub ingest: Option<IngestedLaps>,
    pub design: DesignMatrix,
    pub fits: Vec<StrategyFit>,
    /// Strategies that failed while at least one other succeeded.
    pub failures: Vec<(Strategy, FitError)>,
}

impl RunOutput {
    /// Largest absolute coefficient difference between the fitted strategies.
    pub fn max_coefficient_gap(&self) -> Option<f64> {
        let [first, second] = self.fits.as_slice() else {
            return None;
        };
        Some((&first.solution.x - &second.solution.x).amax())
    }

    /// The strategy that rejected the design as rank deficient or singular,
    /// when another strategy still produced a fit from it.
    pub fn degenerate_design_rejected_by(&self) -> Option<Strategy> {
        if self.fits.is_empty() {
            return None;
        }
        self.failures
            .iter()
            .find(|(_, err)| matches!(err, FitError::RankDeficient { .. } | FitError::SingularMatrix { .. }))
            .map(|(strategy, _)| *strategy)
    }
}

/// Execute the full pipeline for `config`.
pub fn run(config: &FitConfig) -> Result<RunOutput, AppError> {
    let (records, ingest) = load_records(config)?;
    let mut output = run_on_records(&records, config)?;
    output.ingest = ingest;
    Ok(output)
}

fn load_records(config: &FitConfig) -> Result<(RecordSet, Option<IngestedLaps>), AppError> {
    match &config.source {
        RecordSource::Csv(path) => {
            let options = IngestOptions {
                driver: config.driver.clone(),
                include_inaccurate: config.include_inaccurate,
            };
            let ingest = load_lap_records(path, &options)?;
            Ok((ingest.records.clone(), Some(ingest)))
        }
        RecordSource::Synthetic { laps, seed } => Ok((generate_stint(*laps, *seed)?, None)),
    }
}

/// Run the pipeline on an already acquired record set.
pub fn run_on_records(records: &RecordSet, config: &FitConfig) -> Result<RunOutput, AppError> {
    let design = build_feature_matrix(records, &config.features)?;
    log::info!(
        "fitting {} laps x {} columns with {:?}",
        design.rows(),
        design.cols(),
        config.solver
    );

    // Strategies are independent; each works on its own copy of the data.
    let results: Vec<(Strategy, Result<StrategyFit, FitError>)> = config
        .solver
        .strategies()
        .into_par_iter()
        .map(|strategy| (strategy, fit_with(strategy, &design)))
        .collect();

    let mut fits = Vec::new();
    let mut failures = Vec::new();
    for (strategy, result) in results {
        match result {
            Ok(fit) => fits.push(fit),
            Err(err) => {
                log::warn!("{} failed: {err}", strategy.display_name());
                failures.push((strategy, err));
            }
        }
    }

    if fits.is_empty() {
        // Every strategy failed; surface the first failure.
        let (_, err) = failures.remove(0);
        return Err(err.into());
    }

    let output = RunOutput {
        ingest: None,
        design,
        fits,
        failures,
    };
    if let Some(strategy) = output.degenerate_design_rejected_by() {
        log::warn!(
            "{} rejected the design as rank deficient; remaining coefficients are unreliable",
            strategy.display_name()
        );
    }
    Ok(output)
}

/// Solve and evaluate with a single strategy.
pub fn fit_with(strategy: Strategy, design: &DesignMatrix) -> Result<StrategyFit, FitError> {
    let a = design.a.clone();
    let b = design.b.clone();

    let solution = solver_for(strategy).solve(&a, &b)?;
    let quality = metrics::evaluate(&a, &solution.x, &b);
    let predictions = compute_predictions(design, &solution.x);
    let coefficients = pair_coefficients(&design.feature_names, &solution.x);

    Ok(StrategyFit {
        strategy,
        solution,
        coefficients,
        quality,
        predictions,
    })
}

//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the math/fitting code stays clean and testable
//! - output changes are localized

use nalgebra::DMatrix;

use crate::app::pipeline::{RunOutput, StrategyFit};
use crate::domain::{Coefficient, Feature, FitConfig, FitQuality, LapPrediction, RecordSource};
use crate::math::Factors;

/// Above this condition number coefficients should not be trusted.
pub const ILL_CONDITIONED: f64 = 1e8;

/// Format the full run summary (inputs, warnings, per-strategy fits, agreement).
pub fn format_run_summary(run: &RunOutput, config: &FitConfig) -> String {
    let mut out = String::new();

    out.push_str("=== lapfit - Lap Time Regression ===\n");
    match &config.source {
        RecordSource::Csv(path) => out.push_str(&format!("Source: {}\n", path.display())),
        RecordSource::Synthetic { laps, seed } => {
            out.push_str(&format!("Source: synthetic stint ({laps} laps, seed {seed})\n"))
        }
    }
    if let Some(driver) = &config.driver {
        out.push_str(&format!("Driver: {}\n", driver.to_uppercase()));
    }
    if let Some(ingest) = &run.ingest {
        out.push_str(&format!(
            "Rows: read={} used={} | other drivers={} inaccurate={} | cell/row errors={}\n",
            ingest.rows_read,
            ingest.rows_used,
            ingest.dropped_other_drivers,
            ingest.dropped_inaccurate,
            ingest.row_errors.len()
        ));
    }
    out.push_str(&format!(
        "Design: {} laps x {} columns [{}]\n",
        run.design.rows(),
        run.design.cols(),
        run.design.feature_names.join(", ")
    ));

    if !run.design.warnings.is_empty() {
        out.push_str("\nWarnings:\n");
        for warning in &run.design.warnings {
            out.push_str(&format!("- {warning}\n"));
        }
    }

    for fit in &run.fits {
        out.push_str(&format!("\n{}:\n", fit.strategy.display_name()));
        out.push_str(&format_coefficients(&fit.coefficients));
        out.push_str(&format_quality(&fit.quality));
    }

    for (strategy, err) in &run.failures {
        out.push_str(&format!("\n{} failed: {err}\n", strategy.display_name()));
    }
    if let Some(rejected_by) = run.degenerate_design_rejected_by() {
        out.push_str(&format!(
            "Warning: {} found this design rank deficient; the coefficients above come from a \
             (near-)singular system and should not be trusted.\n",
            rejected_by.display_name()
        ));
    }

    if let Some(gap) = run.max_coefficient_gap() {
        out.push_str(&format!("\nStrategy agreement: max |Δx| = {gap:.3e}\n"));
    }

    if config.show_laps {
        if let Some(fit) = run.fits.first() {
            out.push_str(&format!("\nPer-lap fit ({}):\n", fit.strategy.display_name()));
            out.push_str(&format_lap_table(&fit.predictions));
        }
    }

    if config.show_artifacts {
        for fit in &run.fits {
            out.push_str(&format_artifacts(fit));
        }
    }

    out
}

/// Coefficient table: signed value and magnitude, in feature order.
pub fn format_coefficients(coefficients: &[Coefficient]) -> String {
    let mut out = String::new();
    push_row(&mut out, format!("{:<12} {:>14} {:>12}", "feature", "coefficient", "magnitude"));
    push_row(&mut out, format!("{:-<12} {:-<14} {:-<12}", "", "", ""));
    for c in coefficients {
        push_row(
            &mut out,
            format!("{:<12} {:>14.6} {:>12.6}", c.name, c.value, c.value.abs()),
        );
    }
    out
}

pub fn format_quality(quality: &FitQuality) -> String {
    let mut out = format!(
        "residual norm={:.4}s RMSE={:.4}s cond(A)={}",
        quality.residual_norm,
        quality.rmse,
        fmt_cond(quality.condition_number)
    );
    if quality.condition_number > ILL_CONDITIONED {
        out.push_str(" (ill-conditioned: coefficients unreliable)");
    }
    out.push('\n');
    out
}

/// Actual vs predicted lap times.
pub fn format_lap_table(predictions: &[LapPrediction]) -> String {
    let mut out = String::new();
    push_row(&mut out, format!("{:>6} {:>10} {:>10} {:>9}", "lap", "actual", "predicted", "error"));
    push_row(&mut out, format!("{:->6} {:->10} {:->10} {:->9}", "", "", "", ""));
    for p in predictions {
        push_row(
            &mut out,
            format!(
                "{:>6} {:>10.3} {:>10.3} {:>+9.3}",
                fmt_lap(p.lap),
                p.actual,
                p.predicted,
                p.error
            ),
        );
    }
    out
}

/// Triangular factor (and reflector coefficients) of one fit.
pub fn format_artifacts(fit: &StrategyFit) -> String {
    let n = fit.solution.x.len();
    let r = fit.solution.r.view((0, 0), (n, n)).into_owned();

    let mut out = format!("\n{} R ({n}x{n}):\n", fit.strategy.display_name());
    out.push_str(&fmt_matrix(&r));
    if let Factors::Householder { beta, .. } = &fit.solution.factors {
        let parts: Vec<String> = beta.iter().map(|b| format!("{b:.6e}")).collect();
        out.push_str(&format!("beta: [{}]\n", parts.join(", ")));
    }
    out
}

/// The predictor whitelist, one per line.
pub fn format_feature_list() -> String {
    let mut out = String::from("Supported features (design-matrix order):\n");
    for feature in Feature::ALL {
        out.push_str(&format!("  {:<10} {}\n", feature.column_name(), feature.description()));
    }
    out
}

fn push_row(out: &mut String, row: String) {
    out.push_str(row.trim_end());
    out.push('\n');
}

fn fmt_matrix(m: &DMatrix<f64>) -> String {
    let mut out = String::new();
    for row in m.row_iter() {
        let cells: Vec<String> = row.iter().map(|v| format!("{v:>12.4}")).collect();
        push_row(&mut out, cells.join(" "));
    }
    out
}

fn fmt_cond(v: f64) -> String {
    if v.is_finite() { format!("{v:.3e}") } else { "inf".to_string() }
}

fn fmt_lap(lap: f64) -> String {
    if lap.fract() == 0.0 { format!("{lap:.0}") } else { format!("{lap:.1}") }
}

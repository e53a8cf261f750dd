//! Design-matrix construction from a per-lap record set.
//!
//! Produces `(A, b, names)`:
//!
//! - `b` is `LapTime` in seconds, for laps where it is defined
//! - `A[:, 0]` is the intercept (all ones)
//! - the remaining columns are the requested whitelist features, in whitelist
//!   order, with missing cells filled with `0`
//!
//! Requests outside the whitelist and whitelist features without a column are
//! reported as warnings and skipped; they never abort the build.

use nalgebra::{DMatrix, DVector};

use crate::domain::{DesignMatrix, Feature, INTERCEPT_NAME, RecordSet, TARGET_COLUMN};
use crate::error::FitError;

/// Build the design matrix and target vector for the requested features.
pub fn build_feature_matrix(records: &RecordSet, requested: &[String]) -> Result<DesignMatrix, FitError> {
    let target = records
        .column(TARGET_COLUMN)
        .ok_or_else(|| FitError::validation(format!("`{TARGET_COLUMN}` column not found in lap data")))?;

    // Durations become seconds; numeric targets are taken as-is.
    let target_values = target.data.to_seconds();
    let keep: Vec<bool> = target_values
        .iter()
        .map(|v| matches!(v, Some(s) if !s.is_nan()))
        .collect();
    let b: Vec<f64> = target_values.iter().flatten().copied().filter(|s| !s.is_nan()).collect();
    if b.is_empty() {
        return Err(FitError::validation(format!("no laps with a defined `{TARGET_COLUMN}`")));
    }

    let dropped = records.len() - b.len();
    if dropped > 0 {
        log::debug!("dropped {dropped} laps without a defined {TARGET_COLUMN}");
    }
    let laps = records.filter_rows(&keep);

    let mut warnings = Vec::new();
    let selected = select_features(requested);

    let mut columns: Vec<Vec<f64>> = Vec::new();
    let mut feature_names = vec![INTERCEPT_NAME.to_string()];
    for feature in selected {
        match laps.column(feature.column_name()) {
            Some(column) => {
                columns.push(column.data.to_seconds().into_iter().map(|v| v.unwrap_or(0.0)).collect());
                feature_names.push(feature.column_name().to_string());
            }
            None => warnings.push(format!(
                "Feature {feature} (column {}) not available, skipping.",
                feature.column_name()
            )),
        }
    }

    let invalid: Vec<&str> = requested
        .iter()
        .map(String::as_str)
        .filter(|name| Feature::from_name(name).is_none())
        .collect();
    if !invalid.is_empty() {
        warnings.push(format!("Invalid features ignored: {}", invalid.join(", ")));
    }

    for warning in &warnings {
        log::warn!("{warning}");
    }

    if columns.is_empty() {
        let allowed: Vec<&str> = Feature::ALL.iter().map(|f| f.column_name()).collect();
        return Err(FitError::validation(format!(
            "no features could be extracted; select at least one of: {}",
            allowed.join(", ")
        )));
    }

    let m = b.len();
    let n = columns.len() + 1;
    let a = DMatrix::from_fn(m, n, |i, j| {
        let v = if j == 0 { 1.0 } else { columns[j - 1][i] };
        if v.is_finite() { v } else { 0.0 }
    });
    log::debug!("design matrix {m}x{n}: {}", feature_names.join(", "));

    Ok(DesignMatrix {
        a,
        b: DVector::from_vec(b),
        feature_names,
        row_labels: row_labels(&laps),
        warnings,
    })
}

/// Whitelist features named in `requested`, in whitelist order, without repeats.
pub fn select_features(requested: &[String]) -> Vec<Feature> {
    Feature::ALL
        .into_iter()
        .filter(|f| requested.iter().any(|name| name == f.column_name()))
        .collect()
}

fn row_labels(laps: &RecordSet) -> Vec<f64> {
    let lap_numbers = laps
        .column(Feature::LapNumber.column_name())
        .map(|c| c.data.to_seconds());

    (0..laps.len())
        .map(|i| {
            lap_numbers
                .as_ref()
                .and_then(|v| v[i])
                .filter(|v| v.is_finite())
                .unwrap_or((i + 1) as f64)
        })
        .collect()
}

//! Shared domain types.
//!
//! These types are intentionally kept small and owned so every stage can hand a
//! fresh value to the next one:
//!
//! - record sets produced by ingest or the synthetic generator
//! - the design matrix produced by the feature builder
//! - fit outputs consumed by reporting

use std::fmt;
use std::path::PathBuf;

use chrono::Duration;
use clap::ValueEnum;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

/// Column holding the regression target.
pub const TARGET_COLUMN: &str = "LapTime";
/// Label of the always-present first design column.
pub const INTERCEPT_NAME: &str = "Intercept";
/// Optional driver code column used by the ingest driver filter.
pub const DRIVER_COLUMN: &str = "Driver";
/// Optional timing-accuracy flag column.
pub const ACCURACY_COLUMN: &str = "IsAccurate";

/// Recognized predictors, in their fixed whitelist order.
///
/// The declaration order is the order in which columns appear in the design
/// matrix, regardless of the order a caller requests them in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Feature {
    TyreLife,
    TrackTemp,
    WindSpeed,
    AirTemp,
    LapNumber,
}

impl Feature {
    pub const ALL: [Feature; 5] = [
        Feature::TyreLife,
        Feature::TrackTemp,
        Feature::WindSpeed,
        Feature::AirTemp,
        Feature::LapNumber,
    ];

    /// Column name in the record set (also the feature's display name).
    pub fn column_name(self) -> &'static str {
        match self {
            Feature::TyreLife => "TyreLife",
            Feature::TrackTemp => "TrackTemp",
            Feature::WindSpeed => "WindSpeed",
            Feature::AirTemp => "AirTemp",
            Feature::LapNumber => "LapNumber",
        }
    }

    /// Exact, case-sensitive whitelist lookup.
    pub fn from_name(name: &str) -> Option<Feature> {
        Feature::ALL.into_iter().find(|f| f.column_name() == name)
    }

    pub fn description(self) -> &'static str {
        match self {
            Feature::TyreLife => "laps completed on the current tyre set",
            Feature::TrackTemp => "track surface temperature (°C)",
            Feature::WindSpeed => "wind speed (m/s)",
            Feature::AirTemp => "ambient air temperature (°C)",
            Feature::LapNumber => "lap number within the session",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

/// Values of a single column. Missing cells are `None`.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Numeric(Vec<Option<f64>>),
    Duration(Vec<Option<Duration>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(v) => v.len(),
            ColumnData::Duration(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Numeric view of the column; durations are converted to seconds.
    pub fn to_seconds(&self) -> Vec<Option<f64>> {
        match self {
            ColumnData::Numeric(v) => v.clone(),
            ColumnData::Duration(v) => v.iter().map(|d| d.and_then(duration_seconds)).collect(),
        }
    }

    fn select(&self, keep: &[bool]) -> ColumnData {
        fn pick<T: Clone>(values: &[T], keep: &[bool]) -> Vec<T> {
            values
                .iter()
                .zip(keep)
                .filter(|(_, k)| **k)
                .map(|(v, _)| v.clone())
                .collect()
        }
        match self {
            ColumnData::Numeric(v) => ColumnData::Numeric(pick(v, keep)),
            ColumnData::Duration(v) => ColumnData::Duration(pick(v, keep)),
        }
    }
}

/// Seconds (with sub-second precision) in a duration.
pub fn duration_seconds(d: Duration) -> Option<f64> {
    d.num_microseconds().map(|us| us as f64 / 1_000_000.0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

/// An ordered table of per-lap observations.
///
/// All columns have the same length; row `i` of every column describes the same
/// lap.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSet {
    columns: Vec<Column>,
    rows: usize,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column, replacing any existing column with the same name.
    ///
    /// # Panics
    /// Panics if the column length disagrees with the columns already present.
    pub fn with_column(mut self, name: impl Into<String>, data: ColumnData) -> Self {
        let name = name.into();
        if !self.columns.is_empty() {
            assert_eq!(
                data.len(),
                self.rows,
                "column `{name}` has {} rows, record set has {}",
                data.len(),
                self.rows
            );
        }
        self.rows = data.len();
        self.columns.retain(|c| c.name != name);
        self.columns.push(Column { name, data });
        self
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Keep only rows whose mask entry is `true`.
    pub fn filter_rows(&self, keep: &[bool]) -> RecordSet {
        let columns: Vec<Column> = self
            .columns
            .iter()
            .map(|c| Column {
                name: c.name.clone(),
                data: c.data.select(keep),
            })
            .collect();
        let rows = keep.iter().take(self.rows).filter(|k| **k).count();
        RecordSet { columns, rows }
    }
}

/// Output of the feature builder: `A`, `b` and the labels of `A`'s columns.
#[derive(Debug, Clone)]
pub struct DesignMatrix {
    pub a: DMatrix<f64>,
    pub b: DVector<f64>,
    /// One label per column of `a`, starting with `Intercept`.
    pub feature_names: Vec<String>,
    /// Lap label per row of `a` (`LapNumber` when available, else 1-based row index).
    pub row_labels: Vec<f64>,
    /// Non-fatal problems encountered while building.
    pub warnings: Vec<String>,
}

impl DesignMatrix {
    pub fn rows(&self) -> usize {
        self.a.nrows()
    }

    pub fn cols(&self) -> usize {
        self.a.ncols()
    }
}

/// A single QR-based least-squares strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    GramSchmidt,
    Householder,
}

impl Strategy {
    pub fn display_name(self) -> &'static str {
        match self {
            Strategy::GramSchmidt => "Gram-Schmidt (modified)",
            Strategy::Householder => "Householder",
        }
    }
}

/// Which strategies a run should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SolverChoice {
    GramSchmidt,
    Householder,
    /// Run both strategies and compare their coefficients.
    Both,
}

impl SolverChoice {
    pub fn strategies(self) -> Vec<Strategy> {
        match self {
            SolverChoice::GramSchmidt => vec![Strategy::GramSchmidt],
            SolverChoice::Householder => vec![Strategy::Householder],
            SolverChoice::Both => vec![Strategy::GramSchmidt, Strategy::Householder],
        }
    }
}

/// Where the record set of a run comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordSource {
    Csv(PathBuf),
    Synthetic { laps: usize, seed: u64 },
}

/// Fully resolved options for one pipeline run.
#[derive(Debug, Clone)]
pub struct FitConfig {
    pub source: RecordSource,
    pub features: Vec<String>,
    pub solver: SolverChoice,
    pub driver: Option<String>,
    pub include_inaccurate: bool,
    pub show_laps: bool,
    pub show_artifacts: bool,
    /// Also write the fit report as JSON to this path.
    pub json_out: Option<PathBuf>,
}

/// Fit-quality diagnostics; independent scalars derived from `(A, x, b)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitQuality {
    pub residual_norm: f64,
    pub rmse: f64,
    /// `+inf` is written as JSON `null`.
    #[serde(serialize_with = "serialize_unbounded", deserialize_with = "deserialize_unbounded")]
    pub condition_number: f64,
}

fn serialize_unbounded<S: serde::Serializer>(v: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if v.is_finite() {
        serializer.serialize_some(v)
    } else {
        serializer.serialize_none()
    }
}

fn deserialize_unbounded<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
}

/// Actual vs predicted lap time for one row of the design matrix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LapPrediction {
    pub lap: f64,
    pub actual: f64,
    pub predicted: f64,
    /// `actual - predicted`, in seconds.
    pub error: f64,
}

/// One fitted coefficient with its label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coefficient {
    pub name: String,
    pub value: f64,
}

/// One strategy's section of a saved fit report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyReport {
    pub strategy: Strategy,
    pub coefficients: Vec<Coefficient>,
    pub quality: FitQuality,
    pub predictions: Vec<LapPrediction>,
}

/// Portable JSON form of a run: what was fitted and how well.
///
/// The schema is read back by `io::report_file::read_fit_report`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitReportFile {
    pub tool: String,
    pub source: String,
    pub driver: Option<String>,
    pub solver: SolverChoice,
    pub feature_names: Vec<String>,
    pub laps: usize,
    pub warnings: Vec<String>,
    pub fits: Vec<StrategyReport>,
    /// Strategies that failed, with their error message.
    pub failures: Vec<(Strategy, String)>,
    pub max_coefficient_gap: Option<f64>,
}

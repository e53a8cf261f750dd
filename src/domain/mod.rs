//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the per-lap record set (`RecordSet`, `Column`, `ColumnData`)
//! - the predictor whitelist (`Feature`)
//! - run configuration (`FitConfig`, `SolverChoice`, `RecordSource`)
//! - fit outputs (`DesignMatrix`, `FitQuality`, `LapPrediction`, etc.)

pub mod types;

pub use types::*;

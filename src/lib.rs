//! `lapfit` library crate.
//!
//! Fits lap times to a linear model of tyre, weather and race-progress
//! predictors, using two interchangeable QR least-squares strategies
//! (modified Gram–Schmidt and Householder) and reports fit diagnostics.
//!
//! The binary (`lapfit`) is a thin wrapper around this library so that:
//!
//! - the numeric core is testable without spawning processes
//! - record sets can come from any source (CSV, generated, or a caller's own)

pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod features;
pub mod io;
pub mod math;
pub mod report;

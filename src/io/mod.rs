//! Input helpers.
//!
//! - CSV ingest of lap tables into a record set (`ingest`)
//! - JSON fit reports (`report_file`)

pub mod ingest;
pub mod report_file;

pub use ingest::*;

//! CSV ingest of per-lap timing exports.
//!
//! This module turns a tidy lap table (one row per lap, FastF1-style column
//! names) into a `RecordSet` the feature builder can consume.
//!
//! Design goals:
//! - **Lenient headers** (case-insensitive, BOM-tolerant)
//! - **Cell-level validation** (unparseable cells become missing, but are reported)
//! - **Row filters** matching the usual lap selection: one driver, accurate laps only
//! - **Separation of concerns**: no feature or fitting logic here

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::Duration;
use csv::StringRecord;

use crate::domain::{ACCURACY_COLUMN, ColumnData, DRIVER_COLUMN, Feature, RecordSet, TARGET_COLUMN};
use crate::error::{AppError, EXIT_INPUT, EXIT_VALIDATION};

/// Row filters applied while reading.
#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    /// Keep only this driver's laps (matched case-insensitively on `Driver`).
    pub driver: Option<String>,
    /// Keep laps flagged `IsAccurate = false`.
    pub include_inaccurate: bool,
}

/// A cell- or row-level problem encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: the record set plus bookkeeping for the report.
#[derive(Debug, Clone)]
pub struct IngestedLaps {
    pub records: RecordSet,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
    pub dropped_other_drivers: usize,
    pub dropped_inaccurate: usize,
}

/// Open `path` and ingest it.
pub fn load_lap_records(path: &Path, options: &IngestOptions) -> Result<IngestedLaps, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(EXIT_INPUT, format!("Failed to open CSV '{}': {e}", path.display())))?;
    read_lap_records(file, options)
}

/// Ingest lap rows from any CSV reader.
pub fn read_lap_records<R: Read>(input: R, options: &IngestOptions) -> Result<IngestedLaps, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(EXIT_INPUT, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    if !header_map.contains_key(&normalize_header_name(TARGET_COLUMN)) {
        return Err(AppError::new(
            EXIT_INPUT,
            format!("Missing required column: `{TARGET_COLUMN}`"),
        ));
    }
    if options.driver.is_some() && !header_map.contains_key(&normalize_header_name(DRIVER_COLUMN)) {
        return Err(AppError::new(
            EXIT_INPUT,
            format!("Filter `--driver` requires a `{DRIVER_COLUMN}` column in the CSV."),
        ));
    }

    // Raw cells of every known column present in the file, in file order.
    let known = known_columns();
    let mut raw: Vec<(&'static str, Vec<(usize, Option<String>)>)> = known
        .iter()
        .filter(|name| header_map.contains_key(&normalize_header_name(name)))
        .map(|name| (*name, Vec::new()))
        .collect();

    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;
    let mut dropped_other_drivers = 0usize;
    let mut dropped_inaccurate = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2: header is line 1, records are 1-based after it.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        if let Some(driver) = options.driver.as_deref() {
            let value = get_optional(&record, &header_map, DRIVER_COLUMN);
            if !value.is_some_and(|v| v.eq_ignore_ascii_case(driver.trim())) {
                dropped_other_drivers += 1;
                continue;
            }
        }

        if !options.include_inaccurate {
            if let Some(flag) = get_optional(&record, &header_map, ACCURACY_COLUMN) {
                if !parse_flag(flag) {
                    dropped_inaccurate += 1;
                    continue;
                }
            }
        }

        for (name, cells) in raw.iter_mut() {
            let cell = get_optional(&record, &header_map, *name)
                .filter(|s| !is_missing_token(s))
                .map(str::to_string);
            cells.push((line, cell));
        }
    }

    let rows_used = rows_read - row_errors.len() - dropped_other_drivers - dropped_inaccurate;

    if let Some(driver) = options.driver.as_deref() {
        if dropped_other_drivers > 0 && rows_used == 0 && dropped_inaccurate == 0 {
            return Err(AppError::new(
                EXIT_VALIDATION,
                format!("Driver {driver} not found in this session."),
            ));
        }
    }
    if rows_used == 0 {
        return Err(AppError::new(EXIT_VALIDATION, "No valid laps remain after filtering."));
    }

    if dropped_other_drivers > 0 || dropped_inaccurate > 0 {
        log::info!(
            "ingest: kept {rows_used} of {rows_read} rows ({dropped_other_drivers} other drivers, {dropped_inaccurate} inaccurate)"
        );
    }

    let mut records = RecordSet::new();
    for (name, cells) in raw {
        let data = if name == TARGET_COLUMN {
            parse_target_column(name, &cells, &mut row_errors)
        } else {
            parse_numeric_column(name, &cells, &mut row_errors)
        };
        records = records.with_column(name, data);
    }

    for err in &row_errors {
        log::warn!("line {}: {}", err.line, err.message);
    }

    Ok(IngestedLaps {
        records,
        row_errors,
        rows_read,
        rows_used,
        dropped_other_drivers,
        dropped_inaccurate,
    })
}

fn known_columns() -> Vec<&'static str> {
    let mut out = vec![TARGET_COLUMN];
    out.extend(Feature::ALL.iter().map(|f| f.column_name()));
    out
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn get_optional<'a>(record: &'a StringRecord, header_map: &HashMap<String, usize>, name: &str) -> Option<&'a str> {
    let idx = header_map.get(&normalize_header_name(name))?;
    record.get(*idx).map(str::trim).filter(|s| !s.is_empty())
}

fn is_missing_token(s: &str) -> bool {
    ["nan", "nat", "none", "null", "na"]
        .iter()
        .any(|token| s.eq_ignore_ascii_case(token))
}

fn parse_flag(s: &str) -> bool {
    matches!(s.to_ascii_lowercase().as_str(), "true" | "1" | "yes" | "y" | "t")
}

/// A target column is numeric (seconds) when every present cell is a plain
/// number; otherwise it is read as durations.
fn parse_target_column(name: &str, cells: &[(usize, Option<String>)], row_errors: &mut Vec<RowError>) -> ColumnData {
    let all_numeric = cells
        .iter()
        .filter_map(|(_, c)| c.as_deref())
        .all(|s| s.parse::<f64>().is_ok());
    if all_numeric {
        return parse_numeric_column(name, cells, row_errors);
    }

    let values = cells
        .iter()
        .map(|(line, cell)| {
            let s = cell.as_deref()?;
            let parsed = parse_duration(s);
            if parsed.is_none() {
                row_errors.push(RowError {
                    line: *line,
                    message: format!("Invalid `{name}` duration '{s}'; treated as missing."),
                });
            }
            parsed
        })
        .collect();
    ColumnData::Duration(values)
}

fn parse_numeric_column(name: &str, cells: &[(usize, Option<String>)], row_errors: &mut Vec<RowError>) -> ColumnData {
    let values = cells
        .iter()
        .map(|(line, cell)| {
            let s = cell.as_deref()?;
            match s.parse::<f64>() {
                Ok(v) => Some(v),
                Err(_) => {
                    row_errors.push(RowError {
                        line: *line,
                        message: format!("Invalid `{name}` value '{s}'; treated as missing."),
                    });
                    None
                }
            }
        })
        .collect();
    ColumnData::Numeric(values)
}

/// Parse a lap-time duration.
///
/// Accepted forms: `SS.fff`, `M:SS.fff`, `H:MM:SS.fff`, each optionally
/// prefixed by a day count as pandas prints timedeltas
/// (`0 days 00:01:32.456000`).
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    let (days, clock) = match s.split_once("day") {
        Some((days, rest)) => {
            let days: i64 = days.trim().parse().ok()?;
            let rest = rest.trim_start_matches('s').trim();
            (days, rest)
        }
        None => (0, s),
    };

    let parts: Vec<&str> = clock.split(':').collect();
    if parts.is_empty() || parts.len() > 3 {
        return None;
    }

    let seconds: f64 = parts[parts.len() - 1].parse().ok()?;
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    if days < 0 {
        return None;
    }
    let mut whole_units = 0i64;
    for part in &parts[..parts.len() - 1] {
        let v: i64 = part.parse().ok()?;
        if v < 0 {
            return None;
        }
        whole_units = whole_units.checked_mul(60)?.checked_add(v)?;
    }

    // `whole_units` is minutes (M:SS) or hours*60 + minutes (H:MM:SS).
    let whole_seconds = days.checked_mul(86_400)?.checked_add(whole_units.checked_mul(60)?)?;
    let micros = ((whole_seconds as f64 + seconds) * 1_000_000.0).round();
    if !micros.is_finite() || micros >= i64::MAX as f64 {
        return None;
    }
    Some(Duration::microseconds(micros as i64))
}

//! Measurement file ingest.
//!
//! The file layout is fixed:
//!
//! - lines 1–2: metadata (skipped)
//! - line 3: column header (skipped)
//! - remaining lines: whitespace-separated columns; a line is usable only if it
//!   has at least [`MIN_FIELDS`] tokens
//!
//! From each usable line we take token 0 (retardation offset, V), token 3
//! (counts) and token 5 (raw frequency, MHz).
//!
//! Short lines are dropped and counted; a usable line whose required tokens are
//! not numbers rejects the whole file.

use std::fs;
use std::path::Path;

use crate::domain::{MeasurementRecord, MeasurementRow};
use crate::error::HfsError;

/// Lines before the first data line (two metadata lines + header).
pub const SKIP_LINES: usize = 3;
/// Minimum number of whitespace-separated fields for a usable line.
pub const MIN_FIELDS: usize = 7;
/// Minimum number of usable rows for a file to be accepted.
pub const MIN_ROWS: usize = 4;

const OFFSET_FIELD: usize = 0;
const COUNTS_FIELD: usize = 3;
const FREQUENCY_FIELD: usize = 5;

/// Read and parse a measurement file.
pub fn load_records(path: &Path) -> Result<MeasurementRecord, HfsError> {
    let content = fs::read_to_string(path).map_err(|e| {
        HfsError::DataFormat(format!("failed to read '{}': {e}", path.display()))
    })?;
    let record = parse_records(&content)?;
    log::info!(
        "loaded {} rows from '{}' ({} dropped)",
        record.len(),
        path.display(),
        record.rows_dropped
    );
    Ok(record)
}

/// Parse measurement file content.
pub fn parse_records(content: &str) -> Result<MeasurementRecord, HfsError> {
    let mut rows = Vec::new();
    let mut lines_read = 0usize;
    let mut rows_dropped = 0usize;

    for (idx, line) in content.lines().enumerate().skip(SKIP_LINES) {
        let line_no = idx + 1;
        lines_read += 1;

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < MIN_FIELDS {
            rows_dropped += 1;
            continue;
        }

        rows.push(MeasurementRow {
            retardation_offset: parse_field(&fields, OFFSET_FIELD, "retardation offset", line_no)?,
            counts: parse_field(&fields, COUNTS_FIELD, "counts", line_no)?,
            raw_frequency: parse_field(&fields, FREQUENCY_FIELD, "frequency", line_no)?,
        });
    }

    if rows_dropped > 0 {
        log::warn!("dropped {rows_dropped} line(s) with fewer than {MIN_FIELDS} fields");
    }

    if rows.len() < MIN_ROWS {
        return Err(HfsError::DataFormat(format!(
            "only {} usable data row(s) (need at least {MIN_ROWS} lines with {MIN_FIELDS}+ fields after the {SKIP_LINES} header lines)",
            rows.len()
        )));
    }

    Ok(MeasurementRecord {
        rows,
        lines_read,
        rows_dropped,
    })
}

fn parse_field(fields: &[&str], idx: usize, name: &str, line_no: usize) -> Result<f64, HfsError> {
    let raw = fields[idx];
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(HfsError::DataFormat(format!(
            "line {line_no}: could not convert {name} (field {idx}) '{raw}' to float"
        ))),
    }
}

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use csv::StringRecord;
use thiserror::Error;

use super::model::TimingRow;

// ---------------------------------------------------------------------------
// Row parser
// ---------------------------------------------------------------------------

/// Why a raw CSV row could not be turned into a [`TimingRow`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RowError {
    /// Column 0 is not a number. The row carries no usable data.
    #[error("timing '{raw}' is not a number")]
    BadTiming { raw: String },
    /// Column 1 is non-empty but not an integer. The timing itself parsed fine.
    #[error("sample count '{raw}' is not an integer")]
    BadMarker { timing: f64, raw: String },
}

/// What a call site does with a row whose marker column is malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerPolicy {
    /// Keep the timing, drop the marker.
    Tolerate,
    /// Abort reading the file.
    Reject,
}

/// Parse one raw CSV row.
///
/// * no cells → `Ok(None)`
/// * column 0 → trimmed `f64`
/// * column 1 → trimmed integer marker, only when non-empty
pub fn parse_row(record: &StringRecord) -> Result<Option<TimingRow>, RowError> {
    let Some(first) = record.get(0) else {
        return Ok(None);
    };

    let timing = first
        .trim()
        .parse::<f64>()
        .map_err(|_| RowError::BadTiming {
            raw: first.to_string(),
        })?;

    let sample_count = match record.get(1).map(str::trim) {
        Some(cell) if !cell.is_empty() => {
            Some(cell.parse::<i64>().map_err(|_| RowError::BadMarker {
                timing,
                raw: cell.to_string(),
            })?)
        }
        _ => None,
    };

    Ok(Some(TimingRow::new(timing, sample_count)))
}

// ---------------------------------------------------------------------------
// File readers
// ---------------------------------------------------------------------------

/// Read every usable row of one probing-tool CSV, in file order.
///
/// Rows with an unparseable timing are always discarded. Malformed markers
/// follow `policy`; under [`MarkerPolicy::Reject`] the returned error wraps
/// the [`RowError`] with the file path and line number.
pub fn read_timing_rows(path: &Path, policy: MarkerPolicy) -> Result<Vec<TimingRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;

    let mut rows = Vec::new();
    let mut record = StringRecord::new();

    loop {
        let more = reader
            .read_record(&mut record)
            .with_context(|| format!("reading {}", path.display()))?;
        if !more {
            break;
        }
        let line = record.position().map_or(0, |p| p.line());

        match parse_row(&record) {
            Ok(Some(row)) => rows.push(row),
            Ok(None) => {}
            Err(err @ RowError::BadTiming { .. }) => {
                log::debug!("{}:{line}: skipping row, {err}", path.display());
            }
            Err(RowError::BadMarker { timing, raw }) if policy == MarkerPolicy::Tolerate => {
                log::debug!(
                    "{}:{line}: ignoring malformed sample count '{raw}'",
                    path.display()
                );
                rows.push(TimingRow::new(timing, None));
            }
            Err(err) => {
                return Err(err).with_context(|| format!("{}: line {line}", path.display()));
            }
        }
    }

    Ok(rows)
}

/// List the `*.csv` files directly inside `dir`, sorted by file name so that
/// repeated runs see the same order.
pub fn list_csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("listing directory {}", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("listing directory {}", dir.display()))?
            .path();
        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
        if is_csv && path.is_file() {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Base name of a file, used as the report's site name.
pub fn site_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

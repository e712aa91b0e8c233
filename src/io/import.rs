//! CSV import of hourly PV/load match data.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer};
use thiserror::Error;
use tracing::{info, warn};

use crate::series::{HourlyRecord, HourlySeries, SeriesError};

/// Accepted timestamp layouts, tried in order.
const TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Failure to load an hourly series.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("cannot open \"{}\": {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid hourly series: {0}")]
    Series(#[from] SeriesError),
}

/// Required columns; any others (`on_site_use`, `surplus`, ...) are ignored
/// and recomputed from PV and load.
#[derive(Debug, Deserialize)]
struct Row {
    #[serde(deserialize_with = "deserialize_timestamp")]
    timestamp: NaiveDateTime,
    pv_kw: f64,
    load_kw: f64,
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(raw.trim()).ok_or_else(|| {
        serde::de::Error::custom(format!(
            "unrecognised timestamp \"{raw}\" (expected e.g. 2024-01-01 13:00:00)"
        ))
    })
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

/// Reads an hourly series from CSV with a header row.
///
/// Rows are sorted by timestamp before validation, so files written in any
/// order are accepted as long as the hours are contiguous.
///
/// # Errors
///
/// Returns an [`ImportError`] if a row cannot be parsed or the resulting
/// series violates the hourly cadence or value invariants.
pub fn read_series(reader: impl Read) -> Result<HourlySeries, ImportError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut records = Vec::new();
    for row in rdr.deserialize() {
        let row: Row = row?;
        records.push(HourlyRecord::from_pv_load(row.timestamp, row.pv_kw, row.load_kw));
    }

    if !records.is_sorted_by_key(|r| r.timestamp) {
        warn!(rows = records.len(), "input rows are not in timestamp order; sorting");
        records.sort_by_key(|r| r.timestamp);
    }

    let series = HourlySeries::new(records)?;
    if let (Some(first), Some(last)) = (series.first(), series.last()) {
        info!(
            hours = series.len(),
            from = %first.timestamp,
            to = %last.timestamp,
            "loaded hourly series"
        );
    }
    Ok(series)
}

/// Reads an hourly series from a CSV file.
///
/// # Errors
///
/// Returns [`ImportError::Open`] if the file cannot be opened, or any error
/// from [`read_series`].
pub fn read_series_from_path(path: &Path) -> Result<HourlySeries, ImportError> {
    let file = File::open(path).map_err(|source| ImportError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    read_series(io::BufReader::new(file))
}

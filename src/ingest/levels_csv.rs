/// Level logger CSV parser.
///
/// Field exports from the pump-level loggers look like:
///
/// ```text
/// Timestamp;Level above Pump
/// 2024-03-01 00:00:00;31.42
/// 2024-03-01 00:15:00;31.40
/// ```
///
/// Delimiter and column names are configurable (`[ingest]` in wells.toml).
/// Extra columns are ignored. The parser normalizes what the analysis core
/// expects: readings sorted ascending by timestamp, with duplicate
/// timestamps collapsed to the first row seen.
///
/// Row handling:
/// - empty or non-finite level (`NaN`, `inf`): skipped, counted
/// - unparseable level or timestamp: error naming the line
/// - decimal comma (`31,42`): accepted

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, Trim};
use tracing::{debug, warn};

use crate::config::IngestConfig;
use crate::error::IngestError;
use crate::model::{Reading, Series};

/// Formats tried in order after RFC 3339.
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
];

/// Parsed, normalized series plus bookkeeping about dropped rows.
#[derive(Debug, Clone)]
pub struct IngestedSeries {
    pub series: Series,
    /// Data rows in the input (header excluded).
    pub rows_read: usize,
    /// Rows dropped for a missing or non-finite level.
    pub skipped_rows: usize,
    /// Rows dropped because an earlier row had the same timestamp.
    pub duplicate_timestamps: usize,
}

/// Parses a logger export into a sorted, de-duplicated `Series`.
pub fn parse_levels_csv(text: &str, config: &IngestConfig) -> Result<IngestedSeries, IngestError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(config.delimiter_byte())
        .trim(Trim::All)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let timestamp_col = find_column(&headers, &config.timestamp_column)?;
    let level_col = find_column(&headers, &config.level_column)?;

    let mut readings = Vec::new();
    let mut rows_read = 0;
    let mut skipped_rows = 0;

    for record in reader.records() {
        let record = record?;
        rows_read += 1;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let raw_timestamp = record.get(timestamp_col).unwrap_or("");
        let raw_level = record.get(level_col).unwrap_or("");

        let timestamp = parse_timestamp(raw_timestamp).ok_or_else(|| IngestError::InvalidTimestamp {
            line,
            value: raw_timestamp.to_string(),
        })?;

        if raw_level.is_empty() {
            skipped_rows += 1;
            continue;
        }
        let level = parse_level(raw_level).ok_or_else(|| IngestError::InvalidLevel {
            line,
            value: raw_level.to_string(),
        })?;
        if !level.is_finite() {
            skipped_rows += 1;
            continue;
        }

        readings.push(Reading::new(timestamp, level));
    }

    // Stable sort keeps file order among equal timestamps, so dedup keeps the first.
    readings.sort_by_key(|r| r.timestamp);
    let before_dedup = readings.len();
    readings.dedup_by_key(|r| r.timestamp);
    let duplicate_timestamps = before_dedup - readings.len();

    if skipped_rows > 0 {
        warn!(skipped_rows, "rows without a usable level were skipped");
    }
    if duplicate_timestamps > 0 {
        warn!(duplicate_timestamps, "duplicate timestamps collapsed to first reading");
    }

    if readings.is_empty() {
        return Err(IngestError::NoReadings);
    }

    debug!(rows_read, readings = readings.len(), "parsed level CSV");

    Ok(IngestedSeries {
        series: Series::new(readings),
        rows_read,
        skipped_rows,
        duplicate_timestamps,
    })
}

fn find_column(headers: &csv::StringRecord, name: &str) -> Result<usize, IngestError> {
    headers
        .iter()
        .position(|h| h.trim_start_matches('\u{feff}') == name)
        .ok_or_else(|| IngestError::MissingColumn(name.to_string()))
}

/// Parses the timestamp formats seen in logger exports. Offsets are
/// converted to UTC.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    for format in TIMESTAMP_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn parse_level(raw: &str) -> Option<f64> {
    raw.parse::<f64>()
        .ok()
        .or_else(|| {
            if raw.contains(',') && !raw.contains('.') {
                raw.replace(',', ".").parse::<f64>().ok()
            } else {
                None
            }
        })
}

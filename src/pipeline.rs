/// End-to-end analysis of one well: ingest → peaks → cycles → summary.
///
/// The analysis core stays pure; this layer owns everything around it
/// (file reading, logging, the generation timestamp).

use std::fs;
use std::path::Path;
use std::sync::atomic::AtomicBool;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::analysis::cycles::{segment_cycles_interruptible, segment_cycles_with};
use crate::analysis::peaks::locate_peaks;
use crate::analysis::summary::{CycleSummary, summarize};
use crate::config::{AnalysisConfig, IngestConfig, WellRegistry};
use crate::error::{AnalysisError, WellError};
use crate::ingest::levels_csv::{IngestedSeries, parse_levels_csv};
use crate::model::{CycleReport, PeakSet, Series};

/// Everything the presentation layer needs for one well.
#[derive(Debug, Clone, Serialize)]
pub struct WellAnalysis {
    pub well_id: Option<String>,
    pub generated_at: DateTime<Utc>,
    /// The normalized level series (not serialized; use the chart helpers).
    #[serde(skip)]
    pub series: Series,
    pub samples: usize,
    pub first_timestamp: Option<NaiveDateTime>,
    pub last_timestamp: Option<NaiveDateTime>,
    pub skipped_rows: usize,
    pub duplicate_timestamps: usize,
    pub peaks: PeakSet,
    pub report: CycleReport,
    pub summary: CycleSummary,
}

impl WellAnalysis {
    pub fn has_cycles(&self) -> bool {
        !self.report.is_empty()
    }
}

/// Analyses an already-normalized series.
pub fn analyze_series(
    series: Series,
    well_id: Option<&str>,
    config: &AnalysisConfig,
) -> Result<WellAnalysis, AnalysisError> {
    let ingested = IngestedSeries {
        rows_read: series.len(),
        series,
        skipped_rows: 0,
        duplicate_timestamps: 0,
    };
    analyze_ingested(ingested, well_id, config, None)
}

/// Parses a logger export and analyses it.
pub fn analyze_levels_csv(
    text: &str,
    well_id: Option<&str>,
    analysis: &AnalysisConfig,
    ingest: &IngestConfig,
) -> Result<WellAnalysis, WellError> {
    let ingested = parse_levels_csv(text, ingest)?;
    Ok(analyze_ingested(ingested, well_id, analysis, None)?)
}

/// Reads a logger export from disk and analyses it.
pub fn analyze_levels_file(
    path: &Path,
    well_id: Option<&str>,
    analysis: &AnalysisConfig,
    ingest: &IngestConfig,
) -> Result<WellAnalysis, WellError> {
    let text = fs::read_to_string(path)?;
    analyze_levels_csv(&text, well_id, analysis, ingest)
}

/// Analyses a registry well from its configured data file. `cancel`, when
/// given, is checked between cycles.
pub fn analyze_registered_well(
    registry: &WellRegistry,
    well_id: &str,
    cancel: Option<&AtomicBool>,
) -> Result<WellAnalysis, WellError> {
    let well = registry
        .find_well(well_id)
        .ok_or_else(|| WellError::UnknownWell(well_id.to_string()))?;
    let text = fs::read_to_string(registry.data_path(well))?;
    let ingested = parse_levels_csv(&text, &registry.ingest)?;
    Ok(analyze_ingested(ingested, Some(well_id), &registry.analysis, cancel)?)
}

fn analyze_ingested(
    ingested: IngestedSeries,
    well_id: Option<&str>,
    config: &AnalysisConfig,
    cancel: Option<&AtomicBool>,
) -> Result<WellAnalysis, AnalysisError> {
    let series = ingested.series;
    let params = config.segment_params();

    let peaks = locate_peaks(&series, config.min_prominence_m)?;
    let report = match cancel {
        Some(flag) => segment_cycles_interruptible(&series, &peaks, &params, flag)?,
        None => segment_cycles_with(&series, &peaks, &params)?,
    };
    let summary = summarize(&report);

    let label = well_id.unwrap_or("<unnamed>");
    if report.is_empty() {
        warn!(
            well = label,
            samples = series.len(),
            peaks = peaks.len(),
            min_drawdown_m = config.min_drawdown_m,
            "no valid pumping cycles detected"
        );
    } else {
        info!(
            well = label,
            samples = series.len(),
            peaks = peaks.len(),
            cycles = report.len(),
            total_drawdown_m = report.total_drawdown_m(),
            "well analysed"
        );
    }

    Ok(WellAnalysis {
        well_id: well_id.map(str::to_string),
        generated_at: Utc::now(),
        samples: series.len(),
        first_timestamp: series.first_timestamp(),
        last_timestamp: series.last_timestamp(),
        series,
        skipped_rows: ingested.skipped_rows,
        duplicate_timestamps: ingested.duplicate_timestamps,
        peaks,
        report,
        summary,
    })
}

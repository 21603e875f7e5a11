/// Error types for the well monitoring service.
///
/// The analysis core only ever fails on contract violations
/// (`AnalysisError`). Empty results (no peaks, no accepted cycles, no 90%
/// recovery point) are valid outcomes and never surface here.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the peak locator and cycle segmenter.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Empty or non-finite series, or a bad numeric parameter.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Peak indices out of range, decreasing peaks, or non-increasing
    /// timestamps handed to the segmenter.
    #[error("invalid segmentation: {0}")]
    InvalidSegmentation(String),

    /// The caller raised the cancellation flag between cycles.
    #[error("analysis cancelled")]
    Cancelled,
}

/// Errors raised while turning a logger export into a `Series`.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing column '{0}' in header")]
    MissingColumn(String),

    #[error("line {line}: invalid timestamp '{value}'")]
    InvalidTimestamp { line: u64, value: String },

    #[error("line {line}: invalid level '{value}'")]
    InvalidLevel { line: u64, value: String },

    #[error("no usable readings in input")]
    NoReadings,
}

/// Errors raised while loading `wells.toml`.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Umbrella error for the end-to-end pipeline, batch runs and surfaces.
#[derive(Error, Debug)]
pub enum WellError {
    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("export error: {0}")]
    Export(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unknown well '{0}'")]
    UnknownWell(String),
}

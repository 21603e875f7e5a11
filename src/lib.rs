/// wellmon_service: pumped-well water-level cycle analysis.
///
/// # Module structure
///
/// ```text
/// wellmon_service
/// ├── model       — shared data types (Reading, Series, PeakSet, Cycle, CycleColumn, …)
/// ├── error       — error enums for analysis, ingest, config and the pipeline
/// ├── config      — well registry + analysis thresholds (wells.toml)
/// ├── ingest
/// │   ├── levels_csv — logger CSV export → normalized Series
/// │   └── fixtures (test only) — representative logger exports
/// ├── analysis
/// │   ├── peaks   — prominence-filtered local maxima (cycle boundaries)
/// │   ├── cycles  — peak-to-peak segmentation + per-cycle metrics
/// │   └── summary — min/average/max per reported parameter
/// ├── pipeline    — ingest → peaks → cycles → summary for one well
/// ├── batch       — every registry well on a thread pool
/// ├── export      — CSV, chart series and terminal tables
/// ├── endpoint    — HTTP API over the pipeline
/// └── logging     — tracing subscriber setup for the binary
/// ```

/// Public modules
pub mod analysis;
pub mod batch;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod export;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod pipeline;

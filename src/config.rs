/// Well registry loader - parses wells.toml
///
/// Keeps analysis thresholds, the logger CSV dialect and the list of
/// monitored wells out of the code, so a new borehole or a different noise
/// floor needs an edit to wells.toml rather than a rebuild.
///
/// ```toml
/// [analysis]
/// min_prominence_m = 0.0
/// min_drawdown_m = 2.0
/// recovery_fraction = 0.9
/// unit_area_m2 = 1.0
///
/// [ingest]
/// delimiter = ";"
/// timestamp_column = "Timestamp"
/// level_column = "Level above Pump"
///
/// [[well]]
/// well_id = "BH-01"
/// name = "Production borehole 1"
/// data_file = "data/sample_well.csv"
/// ```
///
/// Every section is optional; missing values fall back to the defaults
/// shown above.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::analysis::cycles::{
    DEFAULT_MIN_DRAWDOWN_M, DEFAULT_RECOVERY_FRACTION, DEFAULT_UNIT_AREA_M2, SegmentParams,
};
use crate::error::ConfigError;

/// Default registry location, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "wells.toml";

/// Thresholds for peak detection and cycle acceptance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Peaks need at least this prominence to bound a cycle. 0 keeps every
    /// strict local maximum and leaves noise rejection to `min_drawdown_m`.
    pub min_prominence_m: f64,
    pub min_drawdown_m: f64,
    pub recovery_fraction: f64,
    pub unit_area_m2: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_prominence_m: 0.0,
            min_drawdown_m: DEFAULT_MIN_DRAWDOWN_M,
            recovery_fraction: DEFAULT_RECOVERY_FRACTION,
            unit_area_m2: DEFAULT_UNIT_AREA_M2,
        }
    }
}

impl AnalysisConfig {
    pub fn segment_params(&self) -> SegmentParams {
        SegmentParams {
            min_drawdown_m: self.min_drawdown_m,
            recovery_fraction: self.recovery_fraction,
            unit_area_m2: self.unit_area_m2,
        }
    }
}

/// Logger CSV dialect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Single ASCII character.
    pub delimiter: String,
    pub timestamp_column: String,
    pub level_column: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            delimiter: ";".to_string(),
            timestamp_column: "Timestamp".to_string(),
            level_column: "Level above Pump".to_string(),
        }
    }
}

impl IngestConfig {
    /// Delimiter as the byte the CSV reader wants. Falls back to `;` for
    /// anything `validate` would reject.
    pub fn delimiter_byte(&self) -> u8 {
        match self.delimiter.as_bytes() {
            [b] if b.is_ascii() => *b,
            _ => b';',
        }
    }
}

/// One monitored well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WellConfig {
    pub well_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Logger export, relative to the directory holding wells.toml.
    pub data_file: PathBuf,
}

/// Root configuration structure for TOML parsing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WellRegistry {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default, rename = "well")]
    pub wells: Vec<WellConfig>,
    /// Directory relative data paths are resolved against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl WellRegistry {
    pub fn find_well(&self, well_id: &str) -> Option<&WellConfig> {
        self.wells.iter().find(|w| w.well_id == well_id)
    }

    /// Absolute (or cwd-relative) path of a well's logger export.
    pub fn data_path(&self, well: &WellConfig) -> PathBuf {
        if well.data_file.is_absolute() {
            well.data_file.clone()
        } else {
            self.base_dir.join(&well.data_file)
        }
    }

    /// Checks the values serde cannot: ranges, delimiter shape, unique ids.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let a = &self.analysis;
        if !a.min_prominence_m.is_finite() || a.min_prominence_m < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "analysis.min_prominence_m must be >= 0, got {}",
                a.min_prominence_m
            )));
        }
        if !a.min_drawdown_m.is_finite() || a.min_drawdown_m < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "analysis.min_drawdown_m must be >= 0, got {}",
                a.min_drawdown_m
            )));
        }
        if !(a.recovery_fraction > 0.0 && a.recovery_fraction <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "analysis.recovery_fraction must be in (0, 1], got {}",
                a.recovery_fraction
            )));
        }
        if !a.unit_area_m2.is_finite() || a.unit_area_m2 <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "analysis.unit_area_m2 must be > 0, got {}",
                a.unit_area_m2
            )));
        }

        let delimiter = self.ingest.delimiter.as_bytes();
        if delimiter.len() != 1 || !delimiter[0].is_ascii() {
            return Err(ConfigError::Invalid(format!(
                "ingest.delimiter must be a single ASCII character, got {:?}",
                self.ingest.delimiter
            )));
        }

        let mut seen = HashSet::new();
        for well in &self.wells {
            if well.well_id.trim().is_empty() {
                return Err(ConfigError::Invalid("well_id must not be empty".to_string()));
            }
            if !seen.insert(well.well_id.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate well_id '{}'",
                    well.well_id
                )));
            }
        }

        Ok(())
    }
}

/// Parses and validates registry text. `path` is used for error messages
/// and as the base for relative data paths.
pub fn parse_config(contents: &str, path: &Path) -> Result<WellRegistry, ConfigError> {
    let mut registry: WellRegistry = toml::from_str(contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    registry.base_dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    registry.validate()?;
    Ok(registry)
}

/// Loads the well registry from a wells.toml file.
pub fn load_config(path: impl AsRef<Path>) -> Result<WellRegistry, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&contents, path)
}

/// Loads the registry and builds a lookup map keyed by well id.
pub fn load_config_map(path: impl AsRef<Path>) -> Result<HashMap<String, WellConfig>, ConfigError> {
    Ok(load_config(path)?
        .wells
        .into_iter()
        .map(|w| (w.well_id.clone(), w))
        .collect())
}

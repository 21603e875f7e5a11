/// Shared data types for well level analysis.
///
/// `Series` is produced by the ingest layer and only borrowed by the
/// analysis core. `Cycle` is a fixed-shape record: every downstream consumer
/// (CLI table, CSV writer, charts, HTTP endpoint) reads the same named fields.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Readings and series
// ---------------------------------------------------------------------------

/// One logger sample: water level above the pump intake at an instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub timestamp: NaiveDateTime,
    /// Level above pump, metres.
    pub level_m: f64,
}

impl Reading {
    pub fn new(timestamp: NaiveDateTime, level_m: f64) -> Self {
        Self { timestamp, level_m }
    }
}

/// Time-ordered readings for a single well.
///
/// Construction does not validate ordering or finiteness; the analysis
/// functions check what they rely on and report contract violations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    readings: Vec<Reading>,
}

impl Series {
    pub fn new(readings: Vec<Reading>) -> Self {
        Self { readings }
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    pub fn get(&self, index: usize) -> Option<&Reading> {
        self.readings.get(index)
    }

    /// Level values in series order.
    pub fn levels(&self) -> Vec<f64> {
        self.readings.iter().map(|r| r.level_m).collect()
    }

    pub fn first_timestamp(&self) -> Option<NaiveDateTime> {
        self.readings.first().map(|r| r.timestamp)
    }

    pub fn last_timestamp(&self) -> Option<NaiveDateTime> {
        self.readings.last().map(|r| r.timestamp)
    }
}

impl From<Vec<Reading>> for Series {
    fn from(readings: Vec<Reading>) -> Self {
        Self::new(readings)
    }
}

// ---------------------------------------------------------------------------
// Peaks
// ---------------------------------------------------------------------------

/// Ascending indices into a `Series` marking cycle boundaries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeakSet(Vec<usize>);

impl PeakSet {
    pub fn new(indices: Vec<usize>) -> Self {
        Self(indices)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &usize> {
        self.0.iter()
    }
}

impl From<Vec<usize>> for PeakSet {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices)
    }
}

// ---------------------------------------------------------------------------
// Cycles
// ---------------------------------------------------------------------------

/// One accepted pumping cycle (drawdown followed by recovery) bounded by two
/// consecutive peaks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cycle {
    /// 1-based ordinal among accepted cycles.
    pub cycle_number: u32,

    pub start_index: usize,
    pub min_index: usize,
    pub end_index: usize,

    pub start_time: NaiveDateTime,
    pub min_time: NaiveDateTime,
    pub end_time: NaiveDateTime,

    /// Static water level: level at cycle start.
    pub static_water_level_m: f64,
    pub min_level_m: f64,
    pub max_drawdown_m: f64,

    pub time_to_max_drawdown_hours: f64,
    pub recovery_time_hours: f64,
    pub cycle_duration_hours: f64,

    pub drawdown_rate_m_per_hr: f64,
    pub recharge_rate_m_per_hr: f64,

    /// Hours from the trough to the first sample back at the recovery
    /// threshold. `None` when the level never got there within the cycle.
    pub time_to_90pct_recovery_hours: Option<f64>,

    pub hourly_fluctuation_m_per_hr: f64,
    pub cumulative_drawdown_m: f64,
    pub recharge_volume_m3: f64,
}

/// Accepted cycles for one series, in encounter order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CycleReport {
    pub cycles: Vec<Cycle>,
}

impl CycleReport {
    pub fn len(&self) -> usize {
        self.cycles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cycles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cycle> {
        self.cycles.iter()
    }

    /// Running total after the last accepted cycle (0 when empty).
    pub fn total_drawdown_m(&self) -> f64 {
        self.cycles
            .last()
            .map(|c| c.cumulative_drawdown_m)
            .unwrap_or(0.0)
    }
}

// ---------------------------------------------------------------------------
// Report columns
// ---------------------------------------------------------------------------

/// Numeric per-cycle columns, in report/CSV order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleColumn {
    StaticWaterLevel,
    MaxDrawdown,
    DrawdownRate,
    RecoveryTime,
    RechargeRate,
    TimeToMaxDrawdown,
    TimeTo90PctRecovery,
    HourlyFluctuation,
    CumulativeDrawdown,
    RechargeVolume,
}

impl CycleColumn {
    pub const ALL: [CycleColumn; 10] = [
        CycleColumn::StaticWaterLevel,
        CycleColumn::MaxDrawdown,
        CycleColumn::DrawdownRate,
        CycleColumn::RecoveryTime,
        CycleColumn::RechargeRate,
        CycleColumn::TimeToMaxDrawdown,
        CycleColumn::TimeTo90PctRecovery,
        CycleColumn::HourlyFluctuation,
        CycleColumn::CumulativeDrawdown,
        CycleColumn::RechargeVolume,
    ];

    /// Column heading used in tables and CSV exports.
    pub fn label(&self) -> &'static str {
        match self {
            CycleColumn::StaticWaterLevel => "SWL (m)",
            CycleColumn::MaxDrawdown => "Max Drawdown (m)",
            CycleColumn::DrawdownRate => "Drawdown Rate (m/hr)",
            CycleColumn::RecoveryTime => "Recovery Time (hr)",
            CycleColumn::RechargeRate => "Recharge Rate (m/hr)",
            CycleColumn::TimeToMaxDrawdown => "Time to Max Drawdown (hr)",
            CycleColumn::TimeTo90PctRecovery => "90% Recovery Time (hr)",
            CycleColumn::HourlyFluctuation => "Hourly Fluctuation (m/hr)",
            CycleColumn::CumulativeDrawdown => "Cumulative Drawdown (m)",
            CycleColumn::RechargeVolume => "Recharge Volume (m³)",
        }
    }

    /// Machine-friendly key (query parameters, CLI flags, JSON).
    pub fn key(&self) -> &'static str {
        match self {
            CycleColumn::StaticWaterLevel => "static_water_level",
            CycleColumn::MaxDrawdown => "max_drawdown",
            CycleColumn::DrawdownRate => "drawdown_rate",
            CycleColumn::RecoveryTime => "recovery_time",
            CycleColumn::RechargeRate => "recharge_rate",
            CycleColumn::TimeToMaxDrawdown => "time_to_max_drawdown",
            CycleColumn::TimeTo90PctRecovery => "time_to_90pct_recovery",
            CycleColumn::HourlyFluctuation => "hourly_fluctuation",
            CycleColumn::CumulativeDrawdown => "cumulative_drawdown",
            CycleColumn::RechargeVolume => "recharge_volume",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.key() == key)
    }

    /// Presentation precision: hour durations get 2 decimals, levels,
    /// rates and volumes get 1.
    pub fn decimals(&self) -> u32 {
        match self {
            CycleColumn::RecoveryTime
            | CycleColumn::TimeToMaxDrawdown
            | CycleColumn::TimeTo90PctRecovery => 2,
            _ => 1,
        }
    }

    /// Full-precision value of this column for a cycle.
    pub fn value(&self, cycle: &Cycle) -> Option<f64> {
        match self {
            CycleColumn::StaticWaterLevel => Some(cycle.static_water_level_m),
            CycleColumn::MaxDrawdown => Some(cycle.max_drawdown_m),
            CycleColumn::DrawdownRate => Some(cycle.drawdown_rate_m_per_hr),
            CycleColumn::RecoveryTime => Some(cycle.recovery_time_hours),
            CycleColumn::RechargeRate => Some(cycle.recharge_rate_m_per_hr),
            CycleColumn::TimeToMaxDrawdown => Some(cycle.time_to_max_drawdown_hours),
            CycleColumn::TimeTo90PctRecovery => cycle.time_to_90pct_recovery_hours,
            CycleColumn::HourlyFluctuation => Some(cycle.hourly_fluctuation_m_per_hr),
            CycleColumn::CumulativeDrawdown => Some(cycle.cumulative_drawdown_m),
            CycleColumn::RechargeVolume => Some(cycle.recharge_volume_m3),
        }
    }

    /// Value rounded to this column's presentation precision.
    pub fn rounded(&self, cycle: &Cycle) -> Option<f64> {
        self.value(cycle).map(|v| round_to(v, self.decimals()))
    }
}

/// Rounds half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_keys_round_trip() {
        for column in CycleColumn::ALL {
            assert_eq!(CycleColumn::from_key(column.key()), Some(column));
        }
        assert_eq!(CycleColumn::from_key("nope"), None);
    }

    #[test]
    fn test_hour_columns_use_two_decimals() {
        assert_eq!(CycleColumn::RecoveryTime.decimals(), 2);
        assert_eq!(CycleColumn::TimeTo90PctRecovery.decimals(), 2);
        assert_eq!(CycleColumn::MaxDrawdown.decimals(), 1);
        assert_eq!(CycleColumn::RechargeVolume.decimals(), 1);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(8.04, 1), 8.0);
        assert_eq!(round_to(1.666_666, 2), 1.67);
        assert_eq!(round_to(-2.25, 1), -2.3);
    }

    #[test]
    fn test_empty_report_total_is_zero() {
        assert_eq!(CycleReport::default().total_drawdown_m(), 0.0);
    }
}

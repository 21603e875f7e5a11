/// Cycle segmenter and metric engine.
///
/// Walks consecutive peak pairs in a single forward pass. Each pair bounds a
/// candidate pumping cycle (inclusive of both peaks); the trough inside it
/// gives the drawdown, and timings between start, trough and end give the
/// drawdown and recharge rates.
///
/// # Pass structure
///
/// 1. **Measure**: slice the series between the two peaks and find the
///    first minimum. Degenerate slices (fewer than two samples) are dropped.
/// 2. **Filter**: candidates whose drawdown is below `min_drawdown_m` are
///    dropped. They consume no cycle number and add nothing to the total.
/// 3. **Accept**: the running totals are passed in by value and handed
///    back with the finished `Cycle`, so numbering happens only after
///    filtering and no state outlives the call.
///
/// Any hour delta used as a divisor that comes out as zero gives a rate of
/// zero, never NaN or infinity. Values are kept at full precision; rounding
/// is applied by the export layer only.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AnalysisError;
use crate::model::{Cycle, CycleReport, PeakSet, Reading, Series};

/// Drawdown below this (metres) is treated as sensor noise.
pub const DEFAULT_MIN_DRAWDOWN_M: f64 = 2.0;

/// Fraction of the static water level that counts as "recovered".
pub const DEFAULT_RECOVERY_FRACTION: f64 = 0.9;

/// Cross-sectional area multiplier for recharge volume.
pub const DEFAULT_UNIT_AREA_M2: f64 = 1.0;

/// Tunable thresholds for the segmenter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentParams {
    pub min_drawdown_m: f64,
    pub recovery_fraction: f64,
    pub unit_area_m2: f64,
}

impl Default for SegmentParams {
    fn default() -> Self {
        Self {
            min_drawdown_m: DEFAULT_MIN_DRAWDOWN_M,
            recovery_fraction: DEFAULT_RECOVERY_FRACTION,
            unit_area_m2: DEFAULT_UNIT_AREA_M2,
        }
    }
}

/// Segments `series` into cycles bounded by `peaks`, keeping those with at
/// least `min_drawdown_m` of drawdown.
///
/// Fewer than two peaks yields an empty report, not an error.
///
/// # Errors
/// `InvalidSegmentation` when a peak index is out of range, peaks decrease,
/// or timestamps are not strictly increasing. `InvalidInput` for non-finite
/// levels or thresholds.
pub fn segment_cycles(
    series: &Series,
    peaks: &PeakSet,
    min_drawdown_m: f64,
) -> Result<CycleReport, AnalysisError> {
    let params = SegmentParams {
        min_drawdown_m,
        ..SegmentParams::default()
    };
    segment_cycles_with(series, peaks, &params)
}

/// `segment_cycles` with every threshold configurable.
pub fn segment_cycles_with(
    series: &Series,
    peaks: &PeakSet,
    params: &SegmentParams,
) -> Result<CycleReport, AnalysisError> {
    run(series, peaks, params, None)
}

/// Like `segment_cycles_with`, but checks `cancel` before each candidate
/// cycle and stops with `AnalysisError::Cancelled` once it is set.
pub fn segment_cycles_interruptible(
    series: &Series,
    peaks: &PeakSet,
    params: &SegmentParams,
    cancel: &AtomicBool,
) -> Result<CycleReport, AnalysisError> {
    run(series, peaks, params, Some(cancel))
}

fn run(
    series: &Series,
    peaks: &PeakSet,
    params: &SegmentParams,
    cancel: Option<&AtomicBool>,
) -> Result<CycleReport, AnalysisError> {
    validate(series, peaks, params)?;

    if peaks.len() < 2 {
        debug!(peaks = peaks.len(), "fewer than two peaks, no cycles");
        return Ok(CycleReport::default());
    }

    let mut totals = RunningTotals::default();
    let mut cycles = Vec::new();

    for pair in peaks.as_slice().windows(2) {
        if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
            return Err(AnalysisError::Cancelled);
        }

        let Some(candidate) = Candidate::measure(series.readings(), pair[0], pair[1]) else {
            debug!(start = pair[0], end = pair[1], "degenerate peak pair skipped");
            continue;
        };

        if candidate.max_drawdown_m < params.min_drawdown_m {
            debug!(
                start = pair[0],
                end = pair[1],
                drawdown_m = candidate.max_drawdown_m,
                "cycle below drawdown floor rejected"
            );
            continue;
        }

        let (cycle, next) = totals.accept(series.readings(), &candidate, params);
        cycles.push(cycle);
        totals = next;
    }

    debug!(
        candidates = peaks.len() - 1,
        accepted = cycles.len(),
        "segmentation complete"
    );

    Ok(CycleReport { cycles })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(series: &Series, peaks: &PeakSet, params: &SegmentParams) -> Result<(), AnalysisError> {
    for (name, value) in [
        ("min_drawdown_m", params.min_drawdown_m),
        ("recovery_fraction", params.recovery_fraction),
        ("unit_area_m2", params.unit_area_m2),
    ] {
        if !value.is_finite() {
            return Err(AnalysisError::InvalidInput(format!(
                "{} must be finite, got {}",
                name, value
            )));
        }
    }

    let readings = series.readings();
    if let Some((i, r)) = readings
        .iter()
        .enumerate()
        .find(|(_, r)| !r.level_m.is_finite())
    {
        return Err(AnalysisError::InvalidInput(format!(
            "non-finite level {} at index {}",
            r.level_m, i
        )));
    }

    if let Some(i) = readings
        .windows(2)
        .position(|w| w[1].timestamp <= w[0].timestamp)
    {
        return Err(AnalysisError::InvalidSegmentation(format!(
            "timestamps not strictly increasing at index {} ({} -> {})",
            i + 1,
            readings[i].timestamp,
            readings[i + 1].timestamp
        )));
    }

    if let Some(&index) = peaks.iter().find(|&&p| p >= readings.len()) {
        return Err(AnalysisError::InvalidSegmentation(format!(
            "peak index {} out of range for series of length {}",
            index,
            readings.len()
        )));
    }

    // Equal neighbours are tolerated (skipped as degenerate), decreasing ones are not.
    if let Some(k) = peaks.as_slice().windows(2).position(|w| w[1] < w[0]) {
        return Err(AnalysisError::InvalidSegmentation(format!(
            "peak indices not ascending at position {} ({} -> {})",
            k + 1,
            peaks.as_slice()[k],
            peaks.as_slice()[k + 1]
        )));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Candidate measurement
// ---------------------------------------------------------------------------

/// Raw geometry of a peak-to-peak slice, before thresholding.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    start: usize,
    min: usize,
    end: usize,
    static_water_level_m: f64,
    min_level_m: f64,
    max_drawdown_m: f64,
}

impl Candidate {
    fn measure(readings: &[Reading], start: usize, end: usize) -> Option<Self> {
        if end <= start {
            return None;
        }

        let slice = &readings[start..=end];
        let mut min = 0;
        for (offset, reading) in slice.iter().enumerate() {
            // Strict comparison keeps the first of tied minima.
            if reading.level_m < slice[min].level_m {
                min = offset;
            }
        }

        let static_water_level_m = slice[0].level_m;
        let min_level_m = slice[min].level_m;

        Some(Self {
            start,
            min: start + min,
            end,
            static_water_level_m,
            min_level_m,
            max_drawdown_m: static_water_level_m - min_level_m,
        })
    }
}

// ---------------------------------------------------------------------------
// Accumulation
// ---------------------------------------------------------------------------

/// State threaded through the pass: how many cycles were accepted and the
/// drawdown summed over them.
#[derive(Debug, Clone, Copy, Default)]
struct RunningTotals {
    accepted: u32,
    cumulative_drawdown_m: f64,
}

impl RunningTotals {
    fn accept(self, readings: &[Reading], c: &Candidate, params: &SegmentParams) -> (Cycle, Self) {
        let start_time = readings[c.start].timestamp;
        let min_time = readings[c.min].timestamp;
        let end_time = readings[c.end].timestamp;

        let time_to_max_drawdown_hours = hours_between(start_time, min_time);
        let recovery_time_hours = hours_between(min_time, end_time);
        let cycle_duration_hours = hours_between(start_time, end_time);

        let threshold = params.recovery_fraction * c.static_water_level_m;
        let time_to_90pct_recovery_hours = readings[c.min..=c.end]
            .iter()
            .find(|r| r.level_m >= threshold)
            .map(|r| hours_between(min_time, r.timestamp));

        let next = RunningTotals {
            accepted: self.accepted + 1,
            cumulative_drawdown_m: self.cumulative_drawdown_m + c.max_drawdown_m,
        };

        let cycle = Cycle {
            cycle_number: next.accepted,
            start_index: c.start,
            min_index: c.min,
            end_index: c.end,
            start_time,
            min_time,
            end_time,
            static_water_level_m: c.static_water_level_m,
            min_level_m: c.min_level_m,
            max_drawdown_m: c.max_drawdown_m,
            time_to_max_drawdown_hours,
            recovery_time_hours,
            cycle_duration_hours,
            drawdown_rate_m_per_hr: rate(c.max_drawdown_m, time_to_max_drawdown_hours),
            recharge_rate_m_per_hr: rate(c.max_drawdown_m, recovery_time_hours),
            time_to_90pct_recovery_hours,
            hourly_fluctuation_m_per_hr: rate(c.max_drawdown_m, cycle_duration_hours),
            cumulative_drawdown_m: next.cumulative_drawdown_m,
            recharge_volume_m3: c.max_drawdown_m * params.unit_area_m2,
        };

        (cycle, next)
    }
}

/// Nanosecond resolution; spans too long for i64 nanoseconds fall back to seconds.
fn hours_between(from: NaiveDateTime, to: NaiveDateTime) -> f64 {
    let delta = to - from;
    match delta.num_nanoseconds() {
        Some(ns) => ns as f64 / 3_600_000_000_000.0,
        None => delta.num_seconds() as f64 / 3_600.0,
    }
}

/// Metres per hour, saturating to zero for an instantaneous interval.
fn rate(metres: f64, hours: f64) -> f64 {
    if hours == 0.0 { 0.0 } else { metres / hours }
}

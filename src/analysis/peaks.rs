/// Peak locator: local maxima of the level series, filtered by prominence.
///
/// Peaks mark the pump-off high points that bound pumping cycles. A peak is
/// an interior sample (or flat plateau) strictly higher than the samples on
/// both sides; plateaus are reported once, at their middle index. Boundary
/// samples are never peaks.
///
/// Prominence uses the topographic definition: walk outward from the peak on
/// each side until a strictly higher sample or the series edge; the lowest
/// level seen is that side's base, and prominence is the peak height above
/// the higher of the two bases.

use serde::Serialize;
use tracing::debug;

use crate::error::AnalysisError;
use crate::model::{PeakSet, Series};

/// A detected peak with its prominence, for diagnostics and charting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Peak {
    pub index: usize,
    pub level_m: f64,
    pub prominence_m: f64,
}

/// Returns the ascending indices of peaks whose prominence is at least
/// `min_prominence`.
///
/// # Errors
/// `InvalidInput` for an empty series, a series containing NaN/Inf, or a
/// negative or non-finite `min_prominence`.
pub fn locate_peaks(series: &Series, min_prominence: f64) -> Result<PeakSet, AnalysisError> {
    let peaks = locate_peaks_detailed(series, min_prominence)?;
    Ok(PeakSet::new(peaks.iter().map(|p| p.index).collect()))
}

/// Same as `locate_peaks`, but keeps level and prominence for each peak.
pub fn locate_peaks_detailed(
    series: &Series,
    min_prominence: f64,
) -> Result<Vec<Peak>, AnalysisError> {
    if series.is_empty() {
        return Err(AnalysisError::InvalidInput("series is empty".to_string()));
    }
    if !min_prominence.is_finite() || min_prominence < 0.0 {
        return Err(AnalysisError::InvalidInput(format!(
            "min_prominence must be finite and >= 0, got {}",
            min_prominence
        )));
    }
    if let Some((i, r)) = series
        .readings()
        .iter()
        .enumerate()
        .find(|(_, r)| !r.level_m.is_finite())
    {
        return Err(AnalysisError::InvalidInput(format!(
            "non-finite level {} at index {}",
            r.level_m, i
        )));
    }

    let levels = series.levels();
    let left = left_bases(&levels);
    let right = right_bases(&levels);
    let peaks: Vec<Peak> = local_maxima(&levels)
        .into_iter()
        .map(|index| Peak {
            index,
            level_m: levels[index],
            prominence_m: levels[index] - left[index].max(right[index]),
        })
        .filter(|p| p.prominence_m >= min_prominence)
        .collect();

    debug!(
        samples = levels.len(),
        peaks = peaks.len(),
        min_prominence,
        "located peaks"
    );

    Ok(peaks)
}

/// Interior local maxima, one index per plateau (the middle one).
fn local_maxima(levels: &[f64]) -> Vec<usize> {
    let mut maxima = Vec::new();
    if levels.len() < 3 {
        return maxima;
    }

    let last = levels.len() - 1;
    let mut i = 1;
    while i < last {
        if levels[i - 1] < levels[i] {
            // Skip over a flat top, if any.
            let mut ahead = i + 1;
            while ahead < last && levels[ahead] == levels[i] {
                ahead += 1;
            }
            if levels[ahead] < levels[i] {
                maxima.push((i + ahead - 1) / 2);
                i = ahead;
            }
        }
        i += 1;
    }

    maxima
}

/// For every index, the lowest level between it and the nearest strictly
/// higher sample to its left (or the series start), inclusive of itself.
///
/// Monotonic stack of `(level, segment minimum)`: an entry's segment covers
/// everything it absorbed when popping lower-or-equal entries, so each
/// sample is pushed and popped once.
fn left_bases(levels: &[f64]) -> Vec<f64> {
    let mut bases = Vec::with_capacity(levels.len());
    let mut stack: Vec<(f64, f64)> = Vec::new();

    for &level in levels {
        let mut base = level;
        while let Some(&(top, top_min)) = stack.last() {
            if top > level {
                break;
            }
            base = base.min(top_min);
            stack.pop();
        }
        stack.push((level, base));
        bases.push(base);
    }

    bases
}

/// Mirror of `left_bases`, scanning from the series end.
fn right_bases(levels: &[f64]) -> Vec<f64> {
    let reversed: Vec<f64> = levels.iter().rev().copied().collect();
    let mut bases = left_bases(&reversed);
    bases.reverse();
    bases
}

/// Signal analysis for pumped-well level series.
///
/// Submodules:
/// - `peaks`  : local maxima with prominence filtering (cycle boundaries).
/// - `cycles` : peak-to-peak segmentation and per-cycle metrics.
/// - `summary`: min/mean/max over a finished cycle report.
///
/// Everything here is pure and synchronous: one series in, one report out,
/// no I/O and no state shared between calls.

pub mod cycles;
pub mod peaks;
pub mod summary;

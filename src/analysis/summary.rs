/// Summary statistics over a cycle report.
///
/// One min/mean/max row per numeric column, computed on full-precision
/// values. Absent 90%-recovery times are skipped rather than counted as
/// zero; a column with no values at all reports `None` for every statistic.

use serde::Serialize;

use crate::model::{CycleColumn, CycleReport};

/// Min / mean / max of one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterSummary {
    pub column: CycleColumn,
    pub parameter: &'static str,
    /// Number of cycles contributing a value.
    pub count: usize,
    pub min: Option<f64>,
    pub mean: Option<f64>,
    pub max: Option<f64>,
}

/// Headline figures plus the per-column table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleSummary {
    pub total_cycles: usize,
    pub average_drawdown_m: Option<f64>,
    pub max_recovery_time_hours: Option<f64>,
    pub parameters: Vec<ParameterSummary>,
}

impl CycleSummary {
    pub fn parameter(&self, column: CycleColumn) -> Option<&ParameterSummary> {
        self.parameters.iter().find(|p| p.column == column)
    }
}

pub fn summarize(report: &CycleReport) -> CycleSummary {
    let parameters: Vec<ParameterSummary> = CycleColumn::ALL
        .iter()
        .map(|&column| summarize_column(report, column))
        .collect();

    let average_drawdown_m = parameters
        .iter()
        .find(|p| p.column == CycleColumn::MaxDrawdown)
        .and_then(|p| p.mean);
    let max_recovery_time_hours = parameters
        .iter()
        .find(|p| p.column == CycleColumn::RecoveryTime)
        .and_then(|p| p.max);

    CycleSummary {
        total_cycles: report.len(),
        average_drawdown_m,
        max_recovery_time_hours,
        parameters,
    }
}

fn summarize_column(report: &CycleReport, column: CycleColumn) -> ParameterSummary {
    let values: Vec<f64> = report.iter().filter_map(|c| column.value(c)).collect();

    let (min, mean, max) = if values.is_empty() {
        (None, None, None)
    } else {
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        (Some(min), Some(mean), Some(max))
    };

    ParameterSummary {
        column,
        parameter: column.label(),
        count: values.len(),
        min,
        mean,
        max,
    }
}

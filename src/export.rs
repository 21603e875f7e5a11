/// Report export: CSV, chart series and the plain-text cycle table.
///
/// Values are rounded here, half away from zero via `round_to`. Levels, rates and volumes are
/// shown to 1 decimal, hour durations to 2 (`CycleColumn::decimals`).
/// Cycle CSV column order:
///
/// cycle_number, start_time, SWL, max drawdown, drawdown rate, recovery
/// time, recharge rate, time to max drawdown, 90% recovery time, hourly
/// fluctuation, cumulative drawdown, recharge volume
///
/// An absent 90% recovery time is written as an empty cell.

use std::fmt::Write as _;
use std::io::Write;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::analysis::summary::CycleSummary;
use crate::model::{CycleColumn, CycleReport, Series, round_to};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

/// Header row of the cycle CSV.
pub fn cycle_csv_header() -> Vec<&'static str> {
    let mut header = vec!["cycle_number", "start_time"];
    header.extend(CycleColumn::ALL.iter().map(|c| c.label()));
    header
}

/// Writes one row per accepted cycle, rounded for presentation.
pub fn write_cycles_csv<W: Write>(report: &CycleReport, out: W) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(cycle_csv_header())?;

    for cycle in report.iter() {
        let mut row = vec![
            cycle.cycle_number.to_string(),
            cycle.start_time.format(TIMESTAMP_FORMAT).to_string(),
        ];
        row.extend(CycleColumn::ALL.iter().map(|column| {
            column
                .value(cycle)
                .map(|v| format_value(v, column.decimals()))
                .unwrap_or_default()
        }));
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(())
}

/// Cycle CSV as a string (HTTP responses, tests).
pub fn cycles_csv_string(report: &CycleReport) -> Result<String, csv::Error> {
    let mut buf = Vec::new();
    write_cycles_csv(report, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Writes the min/average/max table, 2 decimals throughout.
pub fn write_summary_csv<W: Write>(summary: &CycleSummary, out: W) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(["Parameter", "Count", "Min", "Average", "Max"])?;

    for p in &summary.parameters {
        let cell = |v: Option<f64>| v.map(|v| format_value(v, 2)).unwrap_or_default();
        writer.write_record([
            p.parameter.to_string(),
            p.count.to_string(),
            cell(p.min),
            cell(p.mean),
            cell(p.max),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// `well_analysis_<id>_<YYYYMMDD>.csv`, or `well_analysis_<YYYYMMDD>.csv`
/// without an id.
pub fn export_file_name(well_id: Option<&str>, date: NaiveDate) -> String {
    let stamp = date.format("%Y%m%d");
    match well_id {
        Some(id) => format!("well_analysis_{}_{}.csv", sanitize(id), stamp),
        None => format!("well_analysis_{}.csv", stamp),
    }
}

fn sanitize(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// Rounds half away from zero first, so text matches `CycleColumn::rounded`.
fn format_value(value: f64, decimals: u32) -> String {
    format!("{:.*}", decimals as usize, round_to(value, decimals))
}

// ---------------------------------------------------------------------------
// Chart data
// ---------------------------------------------------------------------------

/// One point of the level timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelPoint {
    pub timestamp: NaiveDateTime,
    pub level_m: f64,
}

/// One bar of a per-cycle parameter chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnPoint {
    pub cycle_number: u32,
    pub value: Option<f64>,
}

pub fn level_chart_points(series: &Series) -> Vec<LevelPoint> {
    series
        .readings()
        .iter()
        .map(|r| LevelPoint {
            timestamp: r.timestamp,
            level_m: r.level_m,
        })
        .collect()
}

/// Rounded values of one column, one point per accepted cycle.
pub fn column_chart_points(report: &CycleReport, column: CycleColumn) -> Vec<ColumnPoint> {
    report
        .iter()
        .map(|c| ColumnPoint {
            cycle_number: c.cycle_number,
            value: column.rounded(c),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Plain-text table
// ---------------------------------------------------------------------------

/// Fixed-width cycle table for terminal output.
pub fn format_cycle_table(report: &CycleReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>5}  {:<19}  {:>6}  {:>8}  {:>8}  {:>8}  {:>8}  {:>8}  {:>8}",
        "Cycle", "Start", "SWL", "Drawdown", "DD rate", "Rec (h)", "Rech rt", "90% (h)", "Cum DD"
    );
    for c in report.iter() {
        let recovery_90 = c
            .time_to_90pct_recovery_hours
            .map(|v| format_value(v, 2))
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "{:>5}  {:<19}  {:>6}  {:>8}  {:>8}  {:>8}  {:>8}  {:>8}  {:>8}",
            c.cycle_number,
            c.start_time.format(TIMESTAMP_FORMAT).to_string(),
            format_value(c.static_water_level_m, 1),
            format_value(c.max_drawdown_m, 1),
            format_value(c.drawdown_rate_m_per_hr, 1),
            format_value(c.recovery_time_hours, 2),
            format_value(c.recharge_rate_m_per_hr, 1),
            recovery_90,
            format_value(c.cumulative_drawdown_m, 1),
        );
    }
    out
}

/// Min/average/max table for terminal output.
pub fn format_summary_table(summary: &CycleSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<28}  {:>9}  {:>9}  {:>9}", "Parameter", "Min", "Average", "Max");
    for p in &summary.parameters {
        let cell = |v: Option<f64>| v.map(|v| format_value(v, 2)).unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "{:<28}  {:>9}  {:>9}  {:>9}",
            p.parameter,
            cell(p.min),
            cell(p.mean),
            cell(p.max)
        );
    }
    out
}

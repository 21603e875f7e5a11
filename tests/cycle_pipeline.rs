/// Integration tests for the well cycle pipeline
///
/// These tests verify:
/// 1. The bundled logger export analyses end to end through the public API
/// 2. Peaks → cycles → summary agree with hand-computed values
/// 3. CSV export lands on disk with the expected rows and file name
/// 4. The bundled registry drives the batch runner
///
/// Run with: cargo test --test cycle_pipeline

use std::fs;

use chrono::{Duration, NaiveDate};

use wellmon_service::analysis::cycles::segment_cycles;
use wellmon_service::analysis::peaks::locate_peaks;
use wellmon_service::analysis::summary::summarize;
use wellmon_service::batch::analyze_wells;
use wellmon_service::config::{AnalysisConfig, IngestConfig, load_config};
use wellmon_service::export::{export_file_name, write_cycles_csv, write_summary_csv};
use wellmon_service::ingest::levels_csv::parse_levels_csv;
use wellmon_service::model::{CycleColumn, Reading, Series};
use wellmon_service::pipeline::{analyze_levels_csv, analyze_levels_file};

const SAMPLE_WELL: &str = include_str!("../data/sample_well.csv");

fn hourly(levels: &[f64]) -> Series {
    let start = NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    levels
        .iter()
        .enumerate()
        .map(|(i, &l)| Reading::new(start + Duration::hours(i as i64), l))
        .collect::<Vec<_>>()
        .into()
}

#[test]
fn test_sample_export_step_by_step() {
    let ingested = parse_levels_csv(SAMPLE_WELL, &IngestConfig::default()).unwrap();
    assert_eq!(ingested.series.len(), 13);

    let peaks = locate_peaks(&ingested.series, 0.0).unwrap();
    assert_eq!(peaks.as_slice(), &[1, 6, 11]);

    let report = segment_cycles(&ingested.series, &peaks, 2.0).unwrap();
    assert_eq!(report.len(), 2);
    assert_eq!(report.cycles[0].static_water_level_m, 31.0);
    assert_eq!(report.cycles[0].min_level_m, 22.0);
    assert_eq!(report.cycles[0].time_to_max_drawdown_hours, 2.0);
    assert_eq!(report.cycles[0].recovery_time_hours, 3.0);
    assert_eq!(report.cycles[1].cumulative_drawdown_m, 16.0);

    let summary = summarize(&report);
    let drawdown = summary.parameter(CycleColumn::MaxDrawdown).unwrap();
    assert_eq!(drawdown.min, Some(7.0));
    assert_eq!(drawdown.max, Some(9.0));
    assert_eq!(summary.max_recovery_time_hours, Some(3.0));
}

#[test]
fn test_rising_then_falling_example() {
    // Pump switches on after the first peak, level recovers partially,
    // then a deeper drawdown that never reaches 90% of the second SWL.
    let series = hourly(&[10.0, 11.0, 4.0, 3.0, 9.0, 9.2, 9.5, 2.0, 8.0]);
    let peaks = locate_peaks(&series, 0.0).unwrap();
    assert_eq!(peaks.as_slice(), &[1, 6]);

    let report = segment_cycles(&series, &peaks, 2.0).unwrap();
    assert_eq!(report.len(), 1);
    let cycle = &report.cycles[0];
    assert_eq!(cycle.max_drawdown_m, 8.0);
    assert_eq!(cycle.min_index, 3);
    assert_eq!(cycle.drawdown_rate_m_per_hr, 4.0);
    assert_eq!(cycle.time_to_90pct_recovery_hours, None);
}

#[test]
fn test_export_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let analysis = analyze_levels_csv(
        SAMPLE_WELL,
        Some("BH-01"),
        &AnalysisConfig::default(),
        &IngestConfig::default(),
    )
    .unwrap();

    let date = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
    let name = export_file_name(analysis.well_id.as_deref(), date);
    assert_eq!(name, "well_analysis_BH-01_20240302.csv");

    let cycles_path = dir.path().join(&name);
    write_cycles_csv(&analysis.report, fs::File::create(&cycles_path).unwrap()).unwrap();
    let summary_path = dir.path().join("summary.csv");
    write_summary_csv(&analysis.summary, fs::File::create(&summary_path).unwrap()).unwrap();

    let cycles = fs::read_to_string(&cycles_path).unwrap();
    let lines: Vec<&str> = cycles.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("cycle_number,start_time,SWL (m),Max Drawdown (m)"));
    assert!(lines[1].starts_with("1,2024-03-01 01:00:00,31.0,9.0,"));
    assert!(lines[2].starts_with("2,2024-03-01 06:00:00,31.5,7.0,"));

    let summary = fs::read_to_string(&summary_path).unwrap();
    assert!(summary.contains("Max Drawdown (m),2,7.00,8.00,9.00"));
}

#[test]
fn test_analyze_file_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logger.csv");
    fs::write(&path, SAMPLE_WELL).unwrap();

    let analysis = analyze_levels_file(
        &path,
        None,
        &AnalysisConfig::default(),
        &IngestConfig::default(),
    )
    .unwrap();
    assert_eq!(analysis.report.len(), 2);
    assert!(analysis.well_id.is_none());
}

#[test]
fn test_bundled_registry_batch() {
    let registry = load_config("wells.toml").unwrap();
    let outcomes = analyze_wells(&registry, 2);
    let ids: Vec<&str> = outcomes.iter().map(|o| o.well_id.as_str()).collect();
    assert_eq!(ids, vec!["BH-01", "BH-02"]);
    assert!(outcomes.iter().all(|o| o.result.is_ok()));
}

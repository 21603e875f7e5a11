/// Property tests for peak location and cycle segmentation
///
/// Random hourly level series are run through `locate_peaks` and
/// `segment_cycles`; the assertions are the guarantees every report must
/// keep regardless of input shape.
///
/// Run with: cargo test --test cycle_properties

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;

use wellmon_service::analysis::cycles::segment_cycles;
use wellmon_service::analysis::peaks::locate_peaks;
use wellmon_service::model::{PeakSet, Reading, Series};

fn hourly(levels: &[f64]) -> Series {
    let start = NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    Series::new(
        levels
            .iter()
            .enumerate()
            .map(|(i, &l)| Reading::new(start + Duration::hours(i as i64), l))
            .collect(),
    )
}

fn levels(max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.0f64..50.0, 1..max_len)
}

proptest! {
    #[test]
    fn accepted_cycles_clear_the_floor(levels in levels(80), floor in 0.0f64..10.0) {
        let series = hourly(&levels);
        let peaks = locate_peaks(&series, 0.0).unwrap();
        let report = segment_cycles(&series, &peaks, floor).unwrap();

        prop_assert!(report.len() <= peaks.len().saturating_sub(1));
        for (i, cycle) in report.iter().enumerate() {
            prop_assert_eq!(cycle.cycle_number as usize, i + 1);
            prop_assert!(cycle.max_drawdown_m >= floor);
            prop_assert!(cycle.start_index <= cycle.min_index);
            prop_assert!(cycle.min_index <= cycle.end_index);
        }
    }

    #[test]
    fn cumulative_drawdown_is_a_running_sum(levels in levels(80), floor in 0.0f64..5.0) {
        let series = hourly(&levels);
        let peaks = locate_peaks(&series, 0.0).unwrap();
        let report = segment_cycles(&series, &peaks, floor).unwrap();

        let mut sum = 0.0;
        let mut previous = 0.0;
        for cycle in report.iter() {
            sum += cycle.max_drawdown_m;
            prop_assert!((cycle.cumulative_drawdown_m - sum).abs() < 1e-9);
            prop_assert!(cycle.cumulative_drawdown_m >= previous);
            previous = cycle.cumulative_drawdown_m;
        }
    }

    #[test]
    fn metrics_are_finite(levels in levels(80), prominence in 0.0f64..3.0) {
        let series = hourly(&levels);
        let peaks = locate_peaks(&series, prominence).unwrap();
        let report = segment_cycles(&series, &peaks, 0.0).unwrap();

        for cycle in report.iter() {
            prop_assert!(cycle.drawdown_rate_m_per_hr.is_finite());
            prop_assert!(cycle.recharge_rate_m_per_hr.is_finite());
            prop_assert!(cycle.hourly_fluctuation_m_per_hr.is_finite());
            prop_assert!(cycle.recharge_volume_m3.is_finite());
            if let Some(hours) = cycle.time_to_90pct_recovery_hours {
                prop_assert!(hours >= 0.0);
                prop_assert!(hours <= cycle.recovery_time_hours);
            }
        }
    }

    #[test]
    fn segmentation_is_idempotent(levels in levels(60), floor in 0.0f64..5.0) {
        let series = hourly(&levels);
        let peaks = locate_peaks(&series, 0.0).unwrap();
        let first = segment_cycles(&series, &peaks, floor).unwrap();
        let second = segment_cycles(&series, &peaks, floor).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn peaks_are_interior_and_ascending(levels in levels(80), prominence in 0.0f64..5.0) {
        let series = hourly(&levels);
        let peaks = locate_peaks(&series, prominence).unwrap();
        let indices = peaks.as_slice();

        for &p in indices {
            prop_assert!(p > 0 && p + 1 < levels.len());
        }
        prop_assert!(indices.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn raising_prominence_never_adds_peaks(levels in levels(80), low in 0.0f64..2.0, extra in 0.0f64..3.0) {
        let series = hourly(&levels);
        let loose = locate_peaks(&series, low).unwrap();
        let strict = locate_peaks(&series, low + extra).unwrap();
        prop_assert!(strict.iter().all(|p| loose.as_slice().contains(p)));
    }

    #[test]
    fn monotonic_series_has_no_peaks(start in 0.0f64..20.0, steps in prop::collection::vec(0.01f64..2.0, 0..40)) {
        let mut rising = vec![start];
        for step in &steps {
            let next = rising[rising.len() - 1] + step;
            rising.push(next);
        }
        prop_assert!(locate_peaks(&hourly(&rising), 0.0).unwrap().is_empty());

        let falling: Vec<f64> = rising.iter().rev().copied().collect();
        prop_assert!(locate_peaks(&hourly(&falling), 0.0).unwrap().is_empty());
    }

    #[test]
    fn fewer_than_two_peaks_gives_empty_report(levels in levels(40), peak in 0usize..40) {
        let series = hourly(&levels);
        let none = segment_cycles(&series, &PeakSet::default(), 0.0).unwrap();
        let one = segment_cycles(&series, &PeakSet::new(vec![peak % levels.len()]), 0.0).unwrap();
        prop_assert!(none.is_empty());
        prop_assert!(one.is_empty());
    }
}

#[test]
fn short_series_have_no_peaks() {
    assert!(locate_peaks(&hourly(&[]), 0.0).is_err());
    assert!(locate_peaks(&hourly(&[4.2]), 0.0).unwrap().is_empty());
    assert!(locate_peaks(&hourly(&[4.2, 5.0]), 0.0).unwrap().is_empty());
}

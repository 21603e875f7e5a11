/// Test fixtures: logger exports and synthetic series, cfg(test) gated.
///
/// `fixture_two_cycle_csv` is the bundled `data/sample_well.csv`: hourly
/// samples from 2024-03-01 00:00 with peaks at 01:00 (31.0 m), 06:00
/// (31.5 m) and 11:00 (30.8 m). Both cycles clear the 2 m drawdown floor:
///
/// | cycle | SWL  | trough      | drawdown | 90% recovery |
/// |-------|------|-------------|----------|--------------|
/// | 1     | 31.0 | 22.0 @ 03:00 | 9.0     | 2.0 h        |
/// | 2     | 31.5 | 24.5 @ 08:00 | 7.0     | 1.0 h        |

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::model::{Reading, Series};

pub(crate) fn fixture_start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// Series with one sample per hour from `fixture_start()`.
pub(crate) fn hourly_series(levels: &[f64]) -> Series {
    let start = fixture_start();
    Series::new(
        levels
            .iter()
            .enumerate()
            .map(|(i, &level)| Reading::new(start + Duration::hours(i as i64), level))
            .collect(),
    )
}

/// Series from `(minutes after fixture_start(), level)` pairs, in the order given.
pub(crate) fn series_at_minutes(samples: &[(i64, f64)]) -> Series {
    let start = fixture_start();
    Series::new(
        samples
            .iter()
            .map(|&(minutes, level)| Reading::new(start + Duration::minutes(minutes), level))
            .collect(),
    )
}

pub(crate) fn fixture_two_cycle_csv() -> &'static str {
    include_str!("../../data/sample_well.csv")
}

/// Small-amplitude wiggle: three peaks, no cycle reaches 2 m of drawdown.
pub(crate) fn fixture_quiet_csv() -> &'static str {
    include_str!("../../data/quiet_well.csv")
}

pub(crate) fn fixture_unsorted_csv() -> &'static str {
    "Timestamp;Level above Pump\n\
     2024-03-01 02:00:00;30.0\n\
     2024-03-01 00:00:00;10.0\n\
     2024-03-01 01:00:00;20.0\n"
}

/// Second row repeats 01:00; the first value (20.0) must win.
pub(crate) fn fixture_duplicate_csv() -> &'static str {
    "Timestamp;Level above Pump\n\
     2024-03-01 00:00:00;10.0\n\
     2024-03-01 01:00:00;20.0\n\
     2024-03-01 01:00:00;25.0\n\
     2024-03-01 02:00:00;30.0\n"
}

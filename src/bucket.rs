//! # Morning / Afternoon Bucketing
//!
//! Coarsens an hourly series to two values per calendar day.
//!
//! ## Windows
//! - **Morning**: from the `00:00` sample through the `11:00` sample, inclusive
//! - **Afternoon**: from the `12:00` sample through the `23:00` sample, inclusive
//!
//! Window bounds are found by a single scan of the time axis. A date only gets an
//! entry once its `00:00` sample has been seen; boundary samples for dates that
//! never show `00:00` are ignored. Several value series sharing one time axis can
//! be averaged against the same scan with [`bucket`].
//!
//! ## Empty Windows
//! A window whose start or end sample never appeared (the first or last day of a
//! fetched range, usually) averages to `0.0`. The same holds for a window whose
//! samples are all `null`.

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

/// Mean of one series over the morning and afternoon windows of a day.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HalfDayMeans {
    pub am: f64,
    pub pm: f64,
}

/// Index bounds of the two windows of one calendar day on a time axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DayWindows {
    am_start: Option<usize>,
    am_end: Option<usize>,
    pm_start: Option<usize>,
    pm_end: Option<usize>,
}

impl DayWindows {
    /// Inclusive index range of the morning window, if both bounds were seen.
    pub fn morning(&self) -> Option<RangeInclusive<usize>> {
        Some(self.am_start?..=self.am_end?)
    }

    /// Inclusive index range of the afternoon window, if both bounds were seen.
    pub fn afternoon(&self) -> Option<RangeInclusive<usize>> {
        Some(self.pm_start?..=self.pm_end?)
    }

    /// Average `values` over both windows.
    pub fn means(&self, values: &[Option<f64>]) -> HalfDayMeans {
        HalfDayMeans {
            am: window_mean(values, self.morning()),
            pm: window_mean(values, self.afternoon()),
        }
    }
}

/// Scan a time axis once and record the window bounds of every date.
pub fn day_windows(times: &[NaiveDateTime]) -> BTreeMap<NaiveDate, DayWindows> {
    let mut days: BTreeMap<NaiveDate, DayWindows> = BTreeMap::new();

    for (index, time) in times.iter().enumerate() {
        if time.minute() != 0 || time.second() != 0 {
            continue;
        }
        let date = time.date();

        if time.hour() == 0 {
            // A repeated midnight restarts the day
            days.insert(
                date,
                DayWindows {
                    am_start: Some(index),
                    ..DayWindows::default()
                },
            );
            continue;
        }

        let Some(windows) = days.get_mut(&date) else {
            continue;
        };
        match time.hour() {
            11 => windows.am_end = Some(index),
            12 => windows.pm_start = Some(index),
            23 => windows.pm_end = Some(index),
            _ => {}
        }
    }

    days
}

/// Bucket one or more value series that share the `times` axis.
///
/// The returned vector for each date holds one [`HalfDayMeans`] per input
/// series, in the order the series were given.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use sea_forecast_lib::bucket::bucket;
///
/// let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
/// let times: Vec<_> = (0..24).map(|h| day.and_hms_opt(h, 0, 0).unwrap()).collect();
/// let values: Vec<_> = (0..24).map(|h| Some(if h < 12 { 1.0 } else { 3.0 })).collect();
///
/// let buckets = bucket(&times, &[&values]);
/// assert_eq!(buckets[&day][0].am, 1.0);
/// assert_eq!(buckets[&day][0].pm, 3.0);
/// ```
pub fn bucket(
    times: &[NaiveDateTime],
    series: &[&[Option<f64>]],
) -> BTreeMap<NaiveDate, Vec<HalfDayMeans>> {
    day_windows(times)
        .into_iter()
        .map(|(date, windows)| {
            let means = series.iter().map(|values| windows.means(values)).collect();
            (date, means)
        })
        .collect()
}

fn window_mean(values: &[Option<f64>], window: Option<RangeInclusive<usize>>) -> f64 {
    let Some(window) = window else {
        return 0.0;
    };

    // Value arrays shorter than the time axis are clipped, not an error
    let end = (*window.end() + 1).min(values.len());
    let slice = values.get(*window.start()..end).unwrap_or(&[]);

    let (sum, count) = slice
        .iter()
        .flatten()
        .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));

    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

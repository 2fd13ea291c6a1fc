//! # Marine Conditions
//!
//! Hourly wave data from the Open-Meteo marine API, reduced to a morning and an
//! afternoon mean wave height per day and classified into a sea state.
//!
//! ## Sea State Scale
//!
//! Mean wave height `h` in metres, half-open intervals:
//!
//! | Height          | State      |
//! |-----------------|------------|
//! | `h < 0.5`       | Smooth     |
//! | `0.5 ≤ h < 1.25`| Slight     |
//! | `1.25 ≤ h < 2.5`| Moderate   |
//! | `2.5 ≤ h < 4`   | Rough      |
//! | `4 ≤ h < 6`     | Very Rough |
//! | `6 ≤ h < 9`     | High       |
//! | `9 ≤ h < 14`    | Very High  |
//! | `h ≥ 14`        | Phenomenal |

use crate::bucket::bucket;
use crate::round2;
use crate::source::{get_json, Feed, FetchError, OpenMeteoClient};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

const HOURLY_FIELDS: &str = "wave_height,wave_direction,sea_level_height_msl";

/// Raw marine payload; only the hourly block is used.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct RawMarine {
    #[serde(default)]
    pub hourly: MarineHourly,
}

/// Hourly marine series on a shared time axis.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MarineHourly {
    #[serde(default, with = "crate::timestamp::local_datetimes")]
    pub time: Vec<NaiveDateTime>,
    /// Significant wave height in metres
    #[serde(default)]
    pub wave_height: Vec<Option<f64>>,
    /// Mean wave direction in degrees
    #[serde(default)]
    pub wave_direction: Vec<Option<f64>>,
    /// Sea level relative to mean sea level in metres
    #[serde(default)]
    pub sea_level_height_msl: Vec<Option<f64>>,
}

/// Descriptive sea state for a mean wave height.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeaState {
    Smooth,
    Slight,
    Moderate,
    Rough,
    #[serde(rename = "Very Rough")]
    VeryRough,
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
    Phenomenal,
}

impl SeaState {
    /// Classify a mean wave height in metres.
    pub fn from_wave_height(height: f64) -> Self {
        match height {
            h if h < 0.5 => SeaState::Smooth,
            h if h < 1.25 => SeaState::Slight,
            h if h < 2.5 => SeaState::Moderate,
            h if h < 4.0 => SeaState::Rough,
            h if h < 6.0 => SeaState::VeryRough,
            h if h < 9.0 => SeaState::High,
            h if h < 14.0 => SeaState::VeryHigh,
            _ => SeaState::Phenomenal,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SeaState::Smooth => "Smooth",
            SeaState::Slight => "Slight",
            SeaState::Moderate => "Moderate",
            SeaState::Rough => "Rough",
            SeaState::VeryRough => "Very Rough",
            SeaState::High => "High",
            SeaState::VeryHigh => "Very High",
            SeaState::Phenomenal => "Phenomenal",
        }
    }
}

impl fmt::Display for SeaState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Morning and afternoon sea conditions of one date.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarineDay {
    pub am_mean_wave_height: f64,
    pub am_sea_state: SeaState,
    pub pm_mean_wave_height: f64,
    pub pm_sea_state: SeaState,
}

impl MarineDay {
    fn from_means(am: f64, pm: f64) -> Self {
        let am = round2(am);
        let pm = round2(pm);
        Self {
            am_mean_wave_height: am,
            am_sea_state: SeaState::from_wave_height(am),
            pm_mean_wave_height: pm,
            pm_sea_state: SeaState::from_wave_height(pm),
        }
    }
}

/// Normalized marine forecast.
///
/// The hourly arrays are kept next to the per-day summary so they can be
/// inspected or dumped alongside it.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MarineForecast {
    pub hourly: MarineHourly,
    pub days: BTreeMap<NaiveDate, MarineDay>,
}

/// Bucket wave height into morning/afternoon means and classify each.
pub fn normalize_marine(raw: RawMarine) -> MarineForecast {
    let days = bucket(&raw.hourly.time, &[&raw.hourly.wave_height])
        .into_iter()
        .map(|(date, means)| {
            let wave = means.first().copied().unwrap_or_default();
            (date, MarineDay::from_means(wave.am, wave.pm))
        })
        .collect();

    MarineForecast {
        hourly: raw.hourly,
        days,
    }
}

impl OpenMeteoClient {
    /// Hourly wave series for a point.
    pub async fn marine(&self, latitude: f64, longitude: f64) -> Result<RawMarine, FetchError> {
        let mut query = self.location_query(latitude, longitude);
        query.push(("hourly", HOURLY_FIELDS.to_string()));

        let request = self.http.get(&self.marine_url).query(&query);
        let raw: RawMarine = get_json(Feed::Marine, request).await?;
        log::info!("Fetched {} hourly marine samples", raw.hourly.time.len());
        Ok(raw)
    }
}

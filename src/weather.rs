//! # Daily Weather
//!
//! Combines the Open-Meteo daily summary (temperature range, dominant wind,
//! sunrise/sunset, WMO weather code) with morning/afternoon means of the hourly
//! precipitation and visibility series.
//!
//! ## Derived Fields
//! - **Icon id**: WMO weather code mapped to the pictogram the panel shows
//! - **Wind arrow**: dominant wind bearing mapped to one of eight arrows
//!
//! Only dates present in both the daily list and the bucketed hourly series make
//! it into the result.

use crate::bucket::{bucket, HalfDayMeans};
use crate::round2;
use crate::source::{get_json, Feed, FetchError, OpenMeteoClient};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const DAILY_FIELDS: &str = "weathercode,sunrise,sunset,temperature_2m_max,temperature_2m_min,\
wind_direction_10m_dominant,wind_speed_10m_max,wind_gusts_10m_max";
const HOURLY_FIELDS: &str = "precipitation,visibility";
const WIND_SPEED_UNIT: &str = "mph";

/// Arrow per bearing sector, keyed by the exclusive upper bound in degrees.
///
/// The arrow points the way the wind blows, so a northerly shows `↓`.
const WIND_ARROWS: [(&str, f64); 9] = [
    ("↓", 22.5),  // N
    ("↙", 67.5),  // NE
    ("←", 112.5), // E
    ("↖", 157.5), // SE
    ("↑", 202.5), // S
    ("↗", 247.5), // SW
    ("→", 292.5), // W
    ("↘", 337.5), // NW
    ("↓", 360.0), // N again
];

/// Raw weather payload.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct RawWeather {
    #[serde(default)]
    pub daily: WeatherDaily,
    #[serde(default)]
    pub hourly: WeatherHourly,
}

/// Daily series, one entry per date in `time`.
///
/// Values near the end of the forecast horizon may be `null`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct WeatherDaily {
    pub time: Vec<NaiveDate>,
    pub weathercode: Vec<Option<u8>>,
    pub temperature_2m_max: Vec<Option<f64>>,
    pub temperature_2m_min: Vec<Option<f64>>,
    #[serde(with = "crate::timestamp::local_datetimes")]
    pub sunrise: Vec<NaiveDateTime>,
    #[serde(with = "crate::timestamp::local_datetimes")]
    pub sunset: Vec<NaiveDateTime>,
    pub wind_direction_10m_dominant: Vec<Option<f64>>,
    pub wind_speed_10m_max: Vec<Option<f64>>,
    pub wind_gusts_10m_max: Vec<Option<f64>>,
}

/// Hourly series on a shared time axis.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct WeatherHourly {
    #[serde(with = "crate::timestamp::local_datetimes")]
    pub time: Vec<NaiveDateTime>,
    /// Precipitation in mm
    pub precipitation: Vec<Option<f64>>,
    /// Visibility in metres
    pub visibility: Vec<Option<f64>>,
}

/// Daily attributes of one date.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DailyWeather {
    pub weathercode: u8,
    pub weather_icon: String,
    pub temperature_2m_max: f64,
    pub temperature_2m_min: f64,
    #[serde(with = "crate::timestamp::hour_minute")]
    pub sunrise: NaiveTime,
    #[serde(with = "crate::timestamp::hour_minute")]
    pub sunset: NaiveTime,
    pub wind_direction_10m_dominant: f64,
    pub wind_arrow: String,
    pub wind_speed_10m_max: f64,
    pub wind_gusts_10m_max: f64,
}

/// Daily attributes joined with the bucketed hourly means of one date.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WeatherDay {
    #[serde(flatten)]
    pub daily: DailyWeather,
    pub am_precipitation: f64,
    pub pm_precipitation: f64,
    pub am_visibility: f64,
    pub pm_visibility: f64,
}

impl WeatherDay {
    fn join(daily: DailyWeather, precipitation: HalfDayMeans, visibility: HalfDayMeans) -> Self {
        Self {
            daily,
            am_precipitation: round2(precipitation.am),
            pm_precipitation: round2(precipitation.pm),
            am_visibility: round2(visibility.am),
            pm_visibility: round2(visibility.pm),
        }
    }
}

/// Whether an icon should use its daytime or night-time variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Daylight {
    Day,
    Night,
}

/// Map a WMO weather code to a pictogram id.
///
/// Unknown codes fall back to clear sky.
pub fn weather_icon(code: u8, daylight: Daylight) -> &'static str {
    let icon = match code {
        0 => "01d",                 // clear sky
        1 => "022d",                // mainly clear
        2 => "02d",                 // partly cloudy
        3 => "04d",                 // overcast
        51 | 61 | 80 => "51d",      // light drizzle, rain, showers
        53 | 63 | 81 => "53d",      // moderate drizzle, rain, showers
        55 | 65 | 82 => "09d",      // heavy drizzle, rain, showers
        45 => "50d",                // fog
        48 => "48d",                // rime fog
        56 | 66 => "56d",           // light freezing drizzle/rain
        57 | 67 => "57d",           // dense freezing drizzle/rain
        71 | 85 => "71d",           // slight snow
        73 => "73d",                // moderate snow
        75 | 86 => "13d",           // heavy snow
        77 => "77d",                // snow grains
        95 | 96 | 99 => "11d",      // thunderstorm, with or without hail
        _ => "01d",
    };

    match (daylight, icon) {
        (Daylight::Night, "01d") => "01n",
        (Daylight::Night, "022d") => "022n",
        (Daylight::Night, "02d") => "02n",
        (Daylight::Night, "10d") => "10n",
        _ => icon,
    }
}

/// Map a wind bearing in degrees to an arrow.
pub fn wind_arrow(bearing: f64) -> &'static str {
    let bearing = bearing.rem_euclid(360.0);
    WIND_ARROWS
        .iter()
        .find(|(_, upper)| bearing < *upper)
        .map_or("↑", |(arrow, _)| *arrow)
}

/// Build the per-date weather map.
pub fn normalize_weather(raw: &RawWeather) -> BTreeMap<NaiveDate, WeatherDay> {
    let hourly = bucket(
        &raw.hourly.time,
        &[&raw.hourly.precipitation, &raw.hourly.visibility],
    );

    daily_records(&raw.daily)
        .into_iter()
        .filter_map(|(date, daily)| {
            let means = hourly.get(&date)?;
            let (precipitation, visibility) = (means[0], means[1]);
            Some((date, WeatherDay::join(daily, precipitation, visibility)))
        })
        .collect()
}

/// Value at `index`, if the column is long enough and the entry is not null.
fn column_value<T: Copy>(column: &[Option<T>], index: usize) -> Option<T> {
    column.get(index).copied().flatten()
}

/// One record per daily index; dates with a short column or a null value are skipped.
fn daily_records(daily: &WeatherDaily) -> Vec<(NaiveDate, DailyWeather)> {
    daily
        .time
        .iter()
        .enumerate()
        .filter_map(|(i, &date)| {
            let weathercode = column_value(&daily.weathercode, i)?;
            let bearing = column_value(&daily.wind_direction_10m_dominant, i)?;
            let record = DailyWeather {
                weathercode,
                weather_icon: weather_icon(weathercode, Daylight::Day).to_string(),
                temperature_2m_max: column_value(&daily.temperature_2m_max, i)?,
                temperature_2m_min: column_value(&daily.temperature_2m_min, i)?,
                sunrise: daily.sunrise.get(i)?.time(),
                sunset: daily.sunset.get(i)?.time(),
                wind_direction_10m_dominant: bearing,
                wind_arrow: wind_arrow(bearing).to_string(),
                wind_speed_10m_max: column_value(&daily.wind_speed_10m_max, i)?,
                wind_gusts_10m_max: column_value(&daily.wind_gusts_10m_max, i)?,
            };
            Some((date, record))
        })
        .collect()
}

impl OpenMeteoClient {
    /// Daily summary plus hourly precipitation and visibility for a point.
    pub async fn weather(&self, latitude: f64, longitude: f64) -> Result<RawWeather, FetchError> {
        let mut query = self.location_query(latitude, longitude);
        query.push(("daily", DAILY_FIELDS.to_string()));
        query.push(("hourly", HOURLY_FIELDS.to_string()));
        query.push(("wind_speed_unit", WIND_SPEED_UNIT.to_string()));

        let request = self.http.get(&self.forecast_url).query(&query);
        let raw: RawWeather = get_json(Feed::Weather, request).await?;
        log::info!(
            "Fetched {} daily and {} hourly weather samples",
            raw.daily.time.len(),
            raw.hourly.time.len()
        );
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    /// Three daily entries but only two full days of hourly data.
    fn payload() -> RawWeather {
        let time: Vec<String> = (1..=2)
            .flat_map(|day| (0..24).map(move |hour| format!("2024-06-{day:02}T{hour:02}:00")))
            .collect();
        let precipitation: Vec<f64> = (0..48).map(|i| if i % 24 < 12 { 0.0 } else { 0.5 }).collect();
        let visibility: Vec<f64> = (0..48).map(|i| if i < 24 { 24000.0 } else { 8000.0 }).collect();

        serde_json::from_value(serde_json::json!({
            "daily": {
                "time": ["2024-06-01", "2024-06-02", "2024-06-03"],
                "weathercode": [0, 61, 96],
                "temperature_2m_max": [18.4, 16.1, 15.0],
                "temperature_2m_min": [11.2, 10.9, 9.8],
                "sunrise": ["2024-06-01T05:04", "2024-06-02T05:03", "2024-06-03T05:03"],
                "sunset": ["2024-06-01T21:19", "2024-06-02T21:20", "2024-06-03T21:21"],
                "wind_direction_10m_dominant": [10.0, 90.0, 250.0],
                "wind_speed_10m_max": [9.3, 14.8, 21.0],
                "wind_gusts_10m_max": [18.1, 27.5, 40.2]
            },
            "hourly": {
                "time": time,
                "precipitation": precipitation,
                "visibility": visibility
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_icon_table() {
        assert_eq!(weather_icon(0, Daylight::Day), "01d");
        assert_eq!(weather_icon(61, Daylight::Day), "51d");
        assert_eq!(weather_icon(96, Daylight::Day), "11d");
        assert_eq!(weather_icon(7, Daylight::Day), "01d");
        assert_eq!(weather_icon(1, Daylight::Day), "022d");
        assert_eq!(weather_icon(82, Daylight::Day), "09d");
        assert_eq!(weather_icon(45, Daylight::Day), "50d");
        assert_eq!(weather_icon(67, Daylight::Day), "57d");
        assert_eq!(weather_icon(86, Daylight::Day), "13d");
    }

    #[test]
    fn test_night_variants() {
        assert_eq!(weather_icon(0, Daylight::Night), "01n");
        assert_eq!(weather_icon(1, Daylight::Night), "022n");
        assert_eq!(weather_icon(2, Daylight::Night), "02n");
        // Codes without a night pictogram keep the day one
        assert_eq!(weather_icon(3, Daylight::Night), "04d");
        assert_eq!(weather_icon(95, Daylight::Night), "11d");
    }

    #[test]
    fn test_wind_arrows() {
        assert_eq!(wind_arrow(0.0), "↓");
        assert_eq!(wind_arrow(90.0), "←");
        assert_eq!(wind_arrow(359.9), "↓");
        assert_eq!(wind_arrow(360.0), "↓");
        assert_eq!(wind_arrow(22.5), "↙");
        assert_eq!(wind_arrow(180.0), "↑");
        assert_eq!(wind_arrow(270.0), "→");
        assert_eq!(wind_arrow(315.0), "↘");
        assert_eq!(wind_arrow(-90.0), "→");
        assert_eq!(wind_arrow(f64::NAN), "↑");
    }

    #[test]
    fn test_normalize_joins_daily_and_hourly() {
        let weather = normalize_weather(&payload());

        // Day three has no hourly data and is dropped
        assert_eq!(weather.keys().copied().collect::<Vec<_>>(), vec![date(1), date(2)]);

        let first = &weather[&date(1)];
        assert_eq!(first.daily.weather_icon, "01d");
        assert_eq!(first.daily.wind_arrow, "↓");
        assert_eq!(first.daily.sunrise, NaiveTime::from_hms_opt(5, 4, 0).unwrap());
        assert_eq!(first.am_precipitation, 0.0);
        assert_eq!(first.pm_precipitation, 0.5);
        assert_eq!(first.am_visibility, 24000.0);

        let second = &weather[&date(2)];
        assert_eq!(second.daily.weather_icon, "51d");
        assert_eq!(second.daily.wind_arrow, "←");
        assert_eq!(second.pm_visibility, 8000.0);
    }

    #[test]
    fn test_record_serializes_flat() {
        let weather = normalize_weather(&payload());
        let json = serde_json::to_value(&weather[&date(1)]).unwrap();

        assert_eq!(json["weather_icon"], "01d");
        assert_eq!(json["sunrise"], "05:04");
        assert_eq!(json["sunset"], "21:19");
        assert_eq!(json["wind_speed_10m_max"], 9.3);
        assert_eq!(json["pm_precipitation"], 0.5);
        assert!(json.get("daily").is_none());
    }

    #[test]
    fn test_short_daily_column_skips_date() {
        let mut raw = payload();
        raw.daily.wind_gusts_10m_max.truncate(1);

        let weather = normalize_weather(&raw);
        assert_eq!(weather.keys().copied().collect::<Vec<_>>(), vec![date(1)]);
    }

    #[test]
    fn test_null_daily_value_skips_only_that_date() {
        let mut body = serde_json::json!({
            "daily": {
                "time": ["2024-06-01", "2024-06-02"],
                "weathercode": [0, 61],
                "temperature_2m_max": [18.4, 16.1],
                "temperature_2m_min": [11.2, 10.9],
                "sunrise": ["2024-06-01T05:04", "2024-06-02T05:03"],
                "sunset": ["2024-06-01T21:19", "2024-06-02T21:20"],
                "wind_direction_10m_dominant": [10.0, 90.0],
                "wind_speed_10m_max": [9.3, 14.8],
                "wind_gusts_10m_max": [18.1, null]
            }
        });
        body["hourly"] = serde_json::json!({
            "time": (1..=2)
                .flat_map(|day| (0..24).map(move |hour| format!("2024-06-{day:02}T{hour:02}:00")))
                .collect::<Vec<_>>(),
            "precipitation": vec![0.0; 48],
            "visibility": vec![24000.0; 48]
        });

        let raw: RawWeather = serde_json::from_value(body).unwrap();
        assert_eq!(raw.daily.wind_gusts_10m_max, vec![Some(18.1), None]);

        let weather = normalize_weather(&raw);
        assert_eq!(weather.keys().copied().collect::<Vec<_>>(), vec![date(1)]);
        assert_eq!(weather[&date(1)].daily.wind_gusts_10m_max, 18.1);
    }

    #[test]
    fn test_normalize_is_repeatable() {
        let raw = payload();
        assert_eq!(normalize_weather(&raw), normalize_weather(&raw));
    }
}

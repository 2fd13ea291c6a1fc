//! End-to-end tests of the forecast pipeline.
//!
//! The fixtures cover four days of weather, three and a half days of marine
//! data (the feed stops at 11:00 on the fourth day) and three days of tides.

use chrono::{NaiveDate, NaiveTime};
use sea_forecast_lib::config::Config;
use sea_forecast_lib::forecast::{aggregate, assemble, ForecastError};
use sea_forecast_lib::marine::{normalize_marine, RawMarine, SeaState};
use sea_forecast_lib::renderer::{draw_ascii, render};
use sea_forecast_lib::source::{http_client, Feed, OpenMeteoClient};
use sea_forecast_lib::tide_data::{normalize_tides, AdmiraltyClient, RawTideEvent};
use sea_forecast_lib::weather::{normalize_weather, RawWeather};
use sea_forecast_lib::Forecast;
use std::time::Duration;

const TIDAL_EVENTS: &str = include_str!("fixtures/tidal_events.json");
const MARINE: &str = include_str!("fixtures/marine.json");
const WEATHER: &str = include_str!("fixtures/weather.json");
const STATION: &str = include_str!("fixtures/station.json");

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
}

fn tide_events() -> Vec<RawTideEvent> {
    serde_json::from_str(TIDAL_EVENTS).expect("tidal events fixture should parse")
}

fn marine() -> RawMarine {
    serde_json::from_str(MARINE).expect("marine fixture should parse")
}

fn weather() -> RawWeather {
    serde_json::from_str(WEATHER).expect("weather fixture should parse")
}

fn fixture_forecast() -> Forecast {
    assemble(
        "DEVONPORT".to_string(),
        "2024-06-01 06:00".to_string(),
        &tide_events(),
        marine(),
        &weather(),
    )
}

#[test]
fn fixtures_parse() {
    assert_eq!(tide_events().len(), 11);
    assert_eq!(marine().hourly.time.len(), 84);
    assert_eq!(weather().daily.time.len(), 4);
    assert_eq!(weather().hourly.time.len(), 96);

    let station: serde_json::Value = serde_json::from_str(STATION).unwrap();
    assert_eq!(station["properties"]["Name"], "DEVONPORT");
}

/// Each normalizer sees a different set of dates; only the common ones survive.
#[test]
fn merged_days_are_the_intersection_in_weather_order() {
    assert_eq!(normalize_weather(&weather()).len(), 4);
    assert_eq!(normalize_marine(marine()).days.len(), 4);
    assert_eq!(normalize_tides(&tide_events()).len(), 3);

    let forecast = fixture_forecast();
    let dates: Vec<_> = forecast.days.iter().map(|d| d.date).collect();
    assert_eq!(dates, vec![date(1), date(2), date(3)]);

    let labels: Vec<_> = forecast.days.iter().map(|d| d.day.as_str()).collect();
    assert_eq!(labels, vec!["Sat", "Sun", "Mon"]);
}

#[test]
fn first_day_carries_all_three_sources() {
    let forecast = fixture_forecast();
    let day = &forecast.days[0];

    // Weather: code 1 (mainly clear), southerly wind
    assert_eq!(day.icon, "icons/022d.png");
    assert_eq!(day.weather.daily.weathercode, 1);
    assert_eq!(day.weather.daily.wind_arrow, "↑");
    assert_eq!(day.weather.daily.sunrise, NaiveTime::from_hms_opt(5, 0, 0).unwrap());
    assert_eq!(day.weather.daily.sunset, NaiveTime::from_hms_opt(21, 10, 0).unwrap());
    // The null morning precipitation sample is ignored
    assert_eq!(day.weather.am_precipitation, 0.0);
    assert_eq!(day.weather.pm_precipitation, 0.4);
    assert_eq!(day.weather.am_visibility, 24140.0);
    assert_eq!(day.weather.pm_visibility, 16000.0);

    // Marine
    assert_eq!(day.marine.am_mean_wave_height, 0.3);
    assert_eq!(day.marine.am_sea_state, SeaState::Smooth);
    assert_eq!(day.marine.pm_mean_wave_height, 0.6);
    assert_eq!(day.marine.pm_sea_state, SeaState::Slight);

    // Tides, rounded and shortened
    let tides: Vec<_> = day
        .tides
        .iter()
        .map(|t| (t.time.format("%H:%M:%S").to_string(), t.event_type.as_str(), t.height))
        .collect();
    assert_eq!(
        tides,
        vec![
            ("00:41:00".to_string(), "L", 1.03),
            ("06:52:00".to_string(), "H", 4.91),
            ("13:05:00".to_string(), "L", 0.96),
            ("19:17:00".to_string(), "H", 5.09),
        ]
    );
}

#[test]
fn later_days_follow_their_own_data() {
    let forecast = fixture_forecast();

    let second = &forecast.days[1];
    assert_eq!(second.icon, "icons/53d.png");
    assert_eq!(second.weather.daily.wind_arrow, "↗");
    assert_eq!(second.weather.pm_precipitation, 1.2);
    assert_eq!(second.marine.am_sea_state, SeaState::Slight);
    assert_eq!(second.marine.pm_sea_state, SeaState::Moderate);

    let third = &forecast.days[2];
    assert_eq!(third.icon, "icons/04d.png");
    assert_eq!(third.weather.daily.wind_arrow, "↘");
    assert_eq!(third.marine.pm_sea_state, SeaState::Rough);
    // The high water without a height reads as zero
    assert_eq!(third.tides.len(), 3);
    assert_eq!(third.tides[1].height, 0.0);
    assert_eq!(third.tides[0].height, 0.91);
}

#[test]
fn partial_marine_day_has_zero_afternoon() {
    let marine = normalize_marine(marine());
    let last = marine.days[&date(4)];
    assert_eq!(last.am_mean_wave_height, 3.0);
    assert_eq!(last.am_sea_state, SeaState::Rough);
    assert_eq!(last.pm_mean_wave_height, 0.0);
    assert_eq!(last.pm_sea_state, SeaState::Smooth);
}

#[test]
fn pipeline_is_repeatable() {
    assert_eq!(fixture_forecast(), fixture_forecast());
    assert_eq!(normalize_tides(&tide_events()), normalize_tides(&tide_events()));
}

#[test]
fn forecast_serializes_for_the_renderer() {
    let json = serde_json::to_value(fixture_forecast()).unwrap();

    assert_eq!(json["title"], "DEVONPORT");
    let first = &json["days"][0];
    assert_eq!(first["date"], "2024-06-01");
    assert_eq!(first["day"], "Sat");
    assert_eq!(first["icon"], "icons/022d.png");
    assert_eq!(first["tides"][0]["EventType"], "L");
    assert_eq!(first["tides"][0]["Time"], "00:41:00");
    assert_eq!(first["weather"]["weather_icon"], "022d");
    assert_eq!(first["weather"]["sunrise"], "05:00");
    assert_eq!(first["marine"]["pm_sea_state"], "Slight");
}

#[test]
fn fixture_forecast_renders() {
    let forecast = fixture_forecast();

    let frame = render(&forecast, 800, 480).unwrap();
    assert!(frame.ink_count() > 0);

    let text = draw_ascii(&forecast);
    assert!(text.contains("Mon 2024-06-03"));
    assert!(!text.contains("2024-06-04"));
}

fn unreachable_clients() -> (AdmiraltyClient, OpenMeteoClient) {
    // Nothing listens on port 1; requests fail fast
    let http = http_client(Duration::from_secs(2)).unwrap();
    let base = "http://127.0.0.1:1";
    (
        AdmiraltyClient::new(http.clone(), base, "test-key"),
        OpenMeteoClient::new(http, base, base, "Europe/London"),
    )
}

#[test]
fn missing_coordinates_fail_before_fetching() {
    let (admiralty, open_meteo) = unreachable_clients();
    let mut config = Config::default();
    config.location.longitude = None;

    let rt = tokio::runtime::Runtime::new().unwrap();
    let err = rt
        .block_on(aggregate(&config, &admiralty, &open_meteo))
        .unwrap_err();
    assert!(matches!(err, ForecastError::InvalidInput(_)), "{err}");
}

#[test]
fn blank_station_is_rejected() {
    let (admiralty, open_meteo) = unreachable_clients();
    let mut config = Config::default();
    config.location.station_id = "  ".to_string();

    let rt = tokio::runtime::Runtime::new().unwrap();
    let err = rt
        .block_on(aggregate(&config, &admiralty, &open_meteo))
        .unwrap_err();
    assert!(matches!(err, ForecastError::InvalidInput(_)), "{err}");
}

#[test]
fn unreachable_tide_feed_aborts_the_run() {
    let (admiralty, open_meteo) = unreachable_clients();
    let config = Config::default();

    let rt = tokio::runtime::Runtime::new().unwrap();
    let err = rt
        .block_on(aggregate(&config, &admiralty, &open_meteo))
        .unwrap_err();
    match err {
        ForecastError::SourceFetch(fetch) => assert_eq!(fetch.feed(), Feed::Tide),
        other => panic!("expected a fetch failure, got {other}"),
    }
}

#[test]
fn command_line_flag_values() {
    let args: Vec<String> = ["sea-forecast", "--config", "alt.toml", "--stdout"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(crate::flag_value(&args, "--config"), Some("alt.toml"));
    assert_eq!(crate::flag_value(&args, "--output"), None);
    assert_eq!(crate::flag_value(&args, "--stdout"), None);
}

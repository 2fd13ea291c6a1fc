//! # Forecast Assembly
//!
//! Joins the three normalized per-date maps into the day records the panel shows.
//!
//! ## Join Rules
//! - Dates are taken from the weather map, in ascending order
//! - A date is kept only if the tide map and the marine map both have it
//! - Partial days are dropped silently; there are no placeholder records
//!
//! [`aggregate`] runs the whole pipeline: validate the location, fetch the feeds
//! one after another, normalize and merge. Any failure ends the run; a forecast
//! is never assembled from a subset of the feeds. [`write_panel`] turns the
//! result into the image file the display picks up.

use crate::config::{Config, DisplayConfig, TimeFormat};
use crate::marine::{normalize_marine, MarineDay, RawMarine};
use crate::renderer::{render, RenderError};
use crate::source::{FetchError, OpenMeteoClient};
use crate::tide_data::{normalize_tides, AdmiraltyClient, RawTideEvent, TideDay, TideEvent};
use crate::weather::{normalize_weather, RawWeather, WeatherDay};
use chrono::{DateTime, NaiveDate, TimeZone};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Errors that end a forecast run.
#[derive(Error, Debug)]
pub enum ForecastError {
    /// Location settings are missing or out of range
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// One of the upstream feeds could not be retrieved
    #[error(transparent)]
    SourceFetch(#[from] FetchError),

    /// The panel image could not be produced
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// One merged day, ready for display.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ForecastDay {
    pub date: NaiveDate,
    /// Weekday abbreviation, e.g. "Sat"
    pub day: String,
    /// Pictogram file, relative to the asset directory
    pub icon: String,
    pub tides: Vec<TideEvent>,
    pub weather: WeatherDay,
    pub marine: MarineDay,
}

/// Everything the renderer needs.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Forecast {
    /// Tide station name
    pub title: String,
    /// Local time the data was fetched, already formatted
    pub last_refresh: String,
    pub days: Vec<ForecastDay>,
}

/// Path of the pictogram for an icon id.
pub fn icon_path(icon_id: &str) -> String {
    format!("icons/{icon_id}.png")
}

/// Intersect the three per-date maps, in weather date order.
pub fn merge(
    weather: &BTreeMap<NaiveDate, WeatherDay>,
    tides: &BTreeMap<NaiveDate, TideDay>,
    marine: &BTreeMap<NaiveDate, MarineDay>,
) -> Vec<ForecastDay> {
    weather
        .iter()
        .filter_map(|(date, weather)| {
            let tide = tides.get(date)?;
            let marine = marine.get(date)?;
            Some(ForecastDay {
                date: *date,
                day: date.format("%a").to_string(),
                icon: icon_path(&weather.daily.weather_icon),
                tides: tide.tides.clone(),
                weather: weather.clone(),
                marine: *marine,
            })
        })
        .collect()
}

/// Check that both coordinates are present and on the globe.
pub fn validate_coordinates(
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> Result<(f64, f64), ForecastError> {
    let (Some(latitude), Some(longitude)) = (latitude, longitude) else {
        return Err(ForecastError::InvalidInput(
            "latitude and longitude are required".to_string(),
        ));
    };
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(ForecastError::InvalidInput(format!(
            "latitude {latitude} is outside -90..=90"
        )));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(ForecastError::InvalidInput(format!(
            "longitude {longitude} is outside -180..=180"
        )));
    }
    Ok((latitude, longitude))
}

/// Format the refresh timestamp in the configured clock style.
pub fn format_refresh_time<Tz: TimeZone>(now: &DateTime<Tz>, format: TimeFormat) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let pattern = match format {
        TimeFormat::TwentyFourHour => "%Y-%m-%d %H:%M",
        TimeFormat::TwelveHour => "%Y-%m-%d %I:%M %p",
    };
    now.format(pattern).to_string()
}

/// Normalize the raw payloads and merge them.
pub fn assemble(
    title: String,
    last_refresh: String,
    tide_events: &[RawTideEvent],
    marine: RawMarine,
    weather: &RawWeather,
) -> Forecast {
    let tides = normalize_tides(tide_events);
    let marine = normalize_marine(marine);
    let weather = normalize_weather(weather);
    log::debug!(
        "Normalized {} tide days, {} marine days, {} weather days",
        tides.len(),
        marine.days.len(),
        weather.len()
    );

    let days = merge(&weather, &tides, &marine.days);
    Forecast {
        title,
        last_refresh,
        days,
    }
}

/// Fetch all feeds for the configured location and build the forecast.
pub async fn aggregate(
    config: &Config,
    admiralty: &AdmiraltyClient,
    open_meteo: &OpenMeteoClient,
) -> Result<Forecast, ForecastError> {
    let location = &config.location;
    let (latitude, longitude) = validate_coordinates(location.latitude, location.longitude)?;
    let station = location.station_id.trim();
    if station.is_empty() {
        return Err(ForecastError::InvalidInput(
            "tide station id is required".to_string(),
        ));
    }

    log::info!(
        "Fetching forecast for {:.4},{:.4} (tide station {})",
        latitude,
        longitude,
        station
    );
    let tide_events = admiralty.tidal_events(station, location.tide_days).await?;
    let marine = open_meteo.marine(latitude, longitude).await?;
    let weather = open_meteo.weather(latitude, longitude).await?;
    let title = admiralty.station_name(station).await?;

    let last_refresh = format_refresh_time(&chrono::Local::now(), config.display.time_format);
    let forecast = assemble(title, last_refresh, &tide_events, marine, &weather);
    log::info!("Merged forecast covers {} days", forecast.days.len());
    Ok(forecast)
}

/// Render the forecast at the configured panel size and save it as PBM.
pub fn write_panel<P: AsRef<Path>>(
    forecast: &Forecast,
    display: &DisplayConfig,
    path: P,
) -> Result<(), ForecastError> {
    let path = path.as_ref();
    let (width, height) = display.dimensions();
    let frame = render(forecast, width, height)?;
    frame.save_pbm(path)?;
    log::info!(
        "Wrote {}x{} panel with {} days to {}",
        width,
        height,
        forecast.days.len(),
        path.display()
    );
    Ok(())
}

//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the sea-forecast.toml file.
//! It provides a centralized way to configure the forecast location, tide station,
//! upstream API endpoints and display options.
//!
//! The Admiralty API key is a secret and is normally taken from the
//! `TIDAL_API_KEY` environment variable; the config file value is only a fallback.

use crate::source::{FORECAST_URL, MARINE_URL};
use crate::tide_data::ADMIRALTY_URL;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "sea-forecast.toml";

/// Environment variable holding the Admiralty subscription key.
pub const TIDAL_API_KEY_ENV: &str = "TIDAL_API_KEY";

/// Application configuration loaded from sea-forecast.toml
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    /// Forecast point and tide station
    #[serde(default)]
    pub location: LocationConfig,
    /// Upstream API endpoints and credentials
    #[serde(default)]
    pub api: ApiConfig,
    /// Display and UI configuration
    #[serde(default)]
    pub display: DisplayConfig,
}

/// Forecast location configuration
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct LocationConfig {
    /// Latitude in decimal degrees, used for marine and weather data
    pub latitude: Option<f64>,
    /// Longitude in decimal degrees, used for marine and weather data
    pub longitude: Option<f64>,
    /// Admiralty tide station id (e.g., "0014" for Devonport)
    pub station_id: String,
    /// Number of days of tidal events to request
    pub tide_days: u32,
    /// IANA timezone the Open-Meteo series are reported in
    pub timezone: String,
}

/// Upstream API configuration
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Admiralty subscription key; `TIDAL_API_KEY` takes precedence
    pub tidal_api_key: String,
    pub admiralty_url: String,
    pub marine_url: String,
    pub forecast_url: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

/// Panel orientation; vertical swaps width and height.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Horizontal,
    Vertical,
}

/// Clock style for the "last refreshed" line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum TimeFormat {
    #[default]
    #[serde(rename = "24h")]
    TwentyFourHour,
    #[serde(rename = "12h")]
    TwelveHour,
}

/// Display and visualization configuration
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Panel width in pixels
    pub width: u32,
    /// Panel height in pixels
    pub height: u32,
    pub orientation: Orientation,
    pub time_format: TimeFormat,
}

impl Default for LocationConfig {
    fn default() -> Self {
        LocationConfig {
            latitude: Some(50.3625),
            longitude: Some(-4.1846),
            station_id: "0014".to_string(), // Devonport
            tide_days: 7,
            timezone: "Europe/London".to_string(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            tidal_api_key: String::new(),
            admiralty_url: ADMIRALTY_URL.to_string(),
            marine_url: MARINE_URL.to_string(),
            forecast_url: FORECAST_URL.to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            width: 800,  // Inky Impression 7.3"
            height: 480, // Inky Impression 7.3"
            orientation: Orientation::Horizontal,
            time_format: TimeFormat::TwentyFourHour,
        }
    }
}

impl DisplayConfig {
    /// Pixel dimensions as (width, height) after applying the orientation.
    pub fn dimensions(&self) -> (u32, u32) {
        match self.orientation {
            Orientation::Horizontal => (self.width, self.height),
            Orientation::Vertical => (self.height, self.width),
        }
    }
}

impl Config {
    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => {
                    log::info!(
                        "Loaded configuration for station {} from {}",
                        config.location.station_id,
                        path.display()
                    );
                    config
                }
                Err(e) => {
                    log::warn!("Invalid config file format in {}: {}", path.display(), e);
                    log::warn!("Using default configuration (Devonport)");
                    Self::default()
                }
            },
            Err(_) => {
                log::info!(
                    "No config file at {}, using default configuration (Devonport)",
                    path.display()
                );
                Self::default()
            }
        }
    }

    /// Save current configuration to `path`
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path.as_ref(), contents)?;
        log::info!("Configuration saved to {}", path.as_ref().display());
        Ok(())
    }

    /// Admiralty API key from the environment, else from the config file.
    pub fn tidal_api_key(&self) -> String {
        std::env::var(TIDAL_API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .unwrap_or_else(|| self.api.tidal_api_key.clone())
    }
}

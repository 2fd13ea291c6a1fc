//! # Sea Forecast Core Library
//!
//! This library turns three independently shaped forecast feeds into one
//! multi-day forecast for a single coastal location:
//!
//! - **Tides**: discrete high/low water events from the Admiralty UK Tidal API
//! - **Marine**: hourly wave heights from the Open-Meteo marine API
//! - **Weather**: daily summaries plus hourly precipitation and visibility from
//!   the Open-Meteo forecast API
//!
//! ## Temporal Resolution
//!
//! Every feed is reduced to the same key, the calendar date. Hourly series are
//! coarsened to two values per day:
//! - **Morning**: samples from 00:00 through 11:00 inclusive
//! - **Afternoon**: samples from 12:00 through 23:00 inclusive
//!
//! A window that is only partly covered by the fetched range averages to `0.0`.
//!
//! ## Data Flow
//!
//! 1. **Fetch**: [`tide_data::AdmiraltyClient`] and [`source::OpenMeteoClient`]
//!    download raw JSON, sequentially
//! 2. **Normalize**: [`tide_data::normalize_tides`], [`marine::normalize_marine`]
//!    and [`weather::normalize_weather`] build per-date maps
//! 3. **Merge**: [`forecast::merge`] keeps only dates present in all three maps
//! 4. **Render**: [`renderer::render`] draws the result onto a 1-bit panel image
//!
//! Normalizers and the merger are pure functions. Nothing is cached between runs.
//!
//! ## Core Types
//!
//! - [`ForecastDay`]: one merged day ready for display
//! - [`Forecast`]: the complete render input with title and refresh time

pub mod bucket;
pub mod config;
pub mod forecast;
pub mod marine;
pub mod renderer;
pub mod source;
pub mod tide_data;
pub mod timestamp;
pub mod weather;

pub use forecast::{Forecast, ForecastDay, ForecastError};

/// Round to two decimal places, the precision every displayed measurement uses.
///
/// # Example
/// ```
/// use sea_forecast_lib::round2;
///
/// assert_eq!(round2(1.234), 1.23);
/// assert_eq!(round2(0.0), 0.0);
/// ```
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

//! # Forecast Feed Transport
//!
//! Shared HTTP plumbing for the three forecast feeds. Every request goes through
//! [`get_json`], which collapses transport errors, non-2xx responses and
//! undecodable bodies into one [`FetchError`] per feed.
//!
//! There is no retry and no cache: a failed request fails the whole run, and the
//! next run fetches everything again.

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Default Open-Meteo marine endpoint.
pub const MARINE_URL: &str = "https://marine-api.open-meteo.com/v1/marine";

/// Default Open-Meteo forecast endpoint.
pub const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";

const USER_AGENT: &str = concat!("sea-forecast/", env!("CARGO_PKG_VERSION"));

/// The upstream feeds a forecast is assembled from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Feed {
    /// Admiralty tidal events
    Tide,
    /// Admiralty station metadata (display title)
    Station,
    /// Open-Meteo marine hourly series
    Marine,
    /// Open-Meteo daily and hourly weather
    Weather,
}

impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Feed::Tide => "tide",
            Feed::Station => "tide station",
            Feed::Marine => "marine",
            Feed::Weather => "weather",
        };
        f.write_str(name)
    }
}

/// A feed could not be retrieved.
///
/// Callers treat every variant the same way; the detail is only there for logs.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Connection, timeout or protocol failure
    #[error("data retrieval failed for {feed}: {error}")]
    Transport {
        feed: Feed,
        #[source]
        error: reqwest::Error,
    },

    /// The server answered with a non-success status
    #[error("data retrieval failed for {feed}: HTTP {status}")]
    Status { feed: Feed, status: StatusCode },

    /// The body was not the JSON shape we expect
    #[error("data retrieval failed for {feed}: {error}")]
    Decode {
        feed: Feed,
        #[source]
        error: serde_json::Error,
    },
}

impl FetchError {
    /// The feed that failed.
    pub fn feed(&self) -> Feed {
        match self {
            FetchError::Transport { feed, .. }
            | FetchError::Status { feed, .. }
            | FetchError::Decode { feed, .. } => *feed,
        }
    }
}

/// Build the HTTP client shared by all feeds.
pub fn http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
}

/// Send `request` and decode a JSON body of type `T`.
///
/// The body of a non-2xx response is logged before the error is returned.
pub async fn get_json<T: DeserializeOwned>(
    feed: Feed,
    request: RequestBuilder,
) -> Result<T, FetchError> {
    let response = request
        .send()
        .await
        .map_err(|error| FetchError::Transport { feed, error })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        log::error!("Failed to retrieve {} data ({}): {}", feed, status, body);
        return Err(FetchError::Status { feed, status });
    }

    let body = response
        .bytes()
        .await
        .map_err(|error| FetchError::Transport { feed, error })?;
    log::debug!("Received {} bytes of {} data", body.len(), feed);

    serde_json::from_slice(&body).map_err(|error| FetchError::Decode { feed, error })
}

/// Client for both Open-Meteo endpoints.
///
/// Marine and weather requests live in [`crate::marine`] and [`crate::weather`].
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    pub(crate) http: Client,
    pub(crate) marine_url: String,
    pub(crate) forecast_url: String,
    pub(crate) timezone: String,
}

impl OpenMeteoClient {
    pub fn new(
        http: Client,
        marine_url: impl Into<String>,
        forecast_url: impl Into<String>,
        timezone: impl Into<String>,
    ) -> Self {
        Self {
            http,
            marine_url: marine_url.into(),
            forecast_url: forecast_url.into(),
            timezone: timezone.into(),
        }
    }

    /// Query string shared by both endpoints.
    pub(crate) fn location_query(&self, latitude: f64, longitude: f64) -> Vec<(&'static str, String)> {
        vec![
            ("latitude", latitude.to_string()),
            ("longitude", longitude.to_string()),
            ("timezone", self.timezone.clone()),
        ]
    }
}

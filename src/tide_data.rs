//! # Admiralty Tidal Events
//!
//! Fetches high and low water predictions for a UK tide station from the
//! Admiralty UK Tidal API and groups them by calendar date.
//!
//! ## Data Source
//!
//! - **Events**: `GET {base}/Stations/{station}/TidalEvents?duration={days}`
//! - **Station**: `GET {base}/Stations/{station}`, name read from `properties.Name`
//! - **Auth**: `Ocp-Apim-Subscription-Key` header carrying the API key
//!
//! Each event looks like:
//! ```json
//! {
//!   "EventType": "HighWater",
//!   "DateTime": "2024-06-01T05:12:00",
//!   "IsApproximateTime": false,
//!   "Height": 5.0843,
//!   "IsApproximateHeight": false,
//!   "Filtered": false
//! }
//! ```
//!
//! ## Normalization
//! 1. **Split**: `DateTime` becomes a date key and a time of day
//! 2. **Round**: height to 2 decimals, a missing height counts as `0.0`
//! 3. **Shorten**: `EventType` keeps only its first letter (`H` / `L`)
//! 4. **Group**: events are appended to their date in input order
//!
//! The approximation and filter flags are not carried forward.

use crate::round2;
use crate::source::{get_json, Feed, FetchError};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default Admiralty UK Tidal API base URL.
pub const ADMIRALTY_URL: &str = "https://admiraltyapi.azure-api.net/uktidalapi/api/V1";

/// One tidal event exactly as the Admiralty API reports it.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawTideEvent {
    #[serde(with = "crate::timestamp::local_datetime")]
    pub date_time: NaiveDateTime,
    #[serde(default)]
    pub event_type: String,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub is_approximate_time: Option<bool>,
    #[serde(default)]
    pub is_approximate_height: Option<bool>,
    #[serde(default)]
    pub filtered: Option<bool>,
}

/// A tidal event reduced to what the display needs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TideEvent {
    /// Local time of day of the event
    pub time: NaiveTime,
    /// First letter of the event type, `H` or `L`
    pub event_type: String,
    /// Height in metres above chart datum, 2 decimals
    pub height: f64,
}

/// All tidal events of one calendar date, in chronological order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TideDay {
    pub tides: Vec<TideEvent>,
}

/// Group raw events by calendar date.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use sea_forecast_lib::tide_data::{normalize_tides, RawTideEvent};
///
/// let events: Vec<RawTideEvent> = serde_json::from_str(
///     r#"[{"EventType": "LowWater", "DateTime": "2024-06-01T14:32:00", "Height": 1.234}]"#,
/// ).unwrap();
///
/// let days = normalize_tides(&events);
/// let day = &days[&NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()];
/// assert_eq!(day.tides[0].event_type, "L");
/// assert_eq!(day.tides[0].height, 1.23);
/// ```
pub fn normalize_tides(events: &[RawTideEvent]) -> BTreeMap<NaiveDate, TideDay> {
    let mut days: BTreeMap<NaiveDate, TideDay> = BTreeMap::new();

    for event in events {
        let entry = TideEvent {
            time: event.date_time.time(),
            event_type: event.event_type.chars().take(1).collect(),
            height: round2(event.height.unwrap_or(0.0)),
        };
        days.entry(event.date_time.date())
            .or_default()
            .tides
            .push(entry);
    }

    days
}

#[derive(Debug, Deserialize)]
struct StationResponse {
    properties: StationProperties,
}

#[derive(Debug, Deserialize)]
struct StationProperties {
    #[serde(rename = "Name")]
    name: String,
}

/// Client for the Admiralty UK Tidal API.
#[derive(Debug, Clone)]
pub struct AdmiraltyClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl AdmiraltyClient {
    pub fn new(http: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    /// Tidal events for `station` covering the next `duration_days` days.
    pub async fn tidal_events(
        &self,
        station: &str,
        duration_days: u32,
    ) -> Result<Vec<RawTideEvent>, FetchError> {
        let request = self
            .authorized(self.events_url(station))
            .query(&[("duration", duration_days)]);
        let events: Vec<RawTideEvent> = get_json(Feed::Tide, request).await?;
        log::info!("Fetched {} tidal events for station {}", events.len(), station);
        Ok(events)
    }

    /// Human-readable name of `station`, used as the display title.
    pub async fn station_name(&self, station: &str) -> Result<String, FetchError> {
        let request = self.authorized(self.station_url(station));
        let response: StationResponse = get_json(Feed::Station, request).await?;
        Ok(response.properties.name)
    }

    fn events_url(&self, station: &str) -> String {
        format!("{}/Stations/{}/TidalEvents", self.base_url, station)
    }

    fn station_url(&self, station: &str) -> String {
        format!("{}/Stations/{}", self.base_url, station)
    }

    fn authorized(&self, url: String) -> reqwest::RequestBuilder {
        self.http
            .get(url)
            .header("Cache-Control", "no-cache")
            .header("Ocp-Apim-Subscription-Key", &self.api_key)
    }
}

//! Serde helpers for the local ISO-8601 timestamps the forecast feeds use.
//!
//! Open-Meteo reports hourly and sunrise/sunset times with minute resolution
//! (`2024-06-01T13:00`) while the Admiralty API includes seconds
//! (`2024-06-01T14:32:00`). Both forms are accepted on input.

use chrono::{NaiveDateTime, ParseResult};

/// Output format for timestamps written back out (minute resolution).
pub const MINUTE_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Parse a local timestamp with or without seconds.
pub fn parse_local(text: &str) -> ParseResult<NaiveDateTime> {
    text.parse::<NaiveDateTime>()
        .or_else(|_| NaiveDateTime::parse_from_str(text, MINUTE_FORMAT))
}

/// A single local timestamp, input only.
pub mod local_datetime {
    use chrono::NaiveDateTime;
    use serde::{de::Error, Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::parse_local(&text).map_err(|e| D::Error::custom(format!("{text:?}: {e}")))
    }
}

/// A series of local timestamps, e.g. an hourly time axis.
pub mod local_datetimes {
    use chrono::NaiveDateTime;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        values: &[NaiveDateTime],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(
            values
                .iter()
                .map(|value| value.format(super::MINUTE_FORMAT).to_string()),
        )
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<NaiveDateTime>, D::Error> {
        Vec::<String>::deserialize(deserializer)?
            .iter()
            .map(|text| super::parse_local(text).map_err(|e| D::Error::custom(format!("{text:?}: {e}"))))
            .collect()
    }
}

/// Time of day written as `HH:MM`.
pub mod hour_minute {
    use chrono::NaiveTime;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(value: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let text = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&text, FORMAT).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Deserialize, Serialize)]
    struct Axis {
        #[serde(with = "local_datetimes")]
        time: Vec<NaiveDateTime>,
    }

    #[test]
    fn test_parse_minute_and_second_resolution() {
        let expected = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(14, 32, 0)
            .unwrap();
        assert_eq!(parse_local("2024-06-01T14:32").unwrap(), expected);
        assert_eq!(parse_local("2024-06-01T14:32:00").unwrap(), expected);
        assert!(parse_local("2024-06-01").is_err());
    }

    #[test]
    fn test_axis_roundtrip_keeps_minute_format() {
        let axis: Axis = serde_json::from_str(r#"{"time":["2024-06-01T00:00","2024-06-01T01:00"]}"#).unwrap();
        assert_eq!(axis.time.len(), 2);
        assert_eq!(axis.time[1].time(), NaiveTime::from_hms_opt(1, 0, 0).unwrap());

        let json = serde_json::to_string(&axis).unwrap();
        assert_eq!(json, r#"{"time":["2024-06-01T00:00","2024-06-01T01:00"]}"#);
    }

    #[test]
    fn test_bad_timestamp_is_reported() {
        let err = serde_json::from_str::<Axis>(r#"{"time":["yesterday"]}"#).unwrap_err();
        assert!(err.to_string().contains("yesterday"));
    }
}

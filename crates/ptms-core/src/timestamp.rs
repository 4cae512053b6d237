//! ISO-8601 timestamp codec.
//!
//! Records are written with millisecond precision and a `Z` suffix
//! (`2024-05-01T12:00:00.000Z`). Any RFC 3339 string is accepted on read.
//! Use with `#[serde(with = "ptms_core::timestamp")]`, or the [`option`]
//! submodule for nullable fields.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serializer};

/// Format a timestamp the way it is stored.
pub fn to_iso(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse an RFC 3339 timestamp into UTC.
pub fn parse_iso(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc))
}

/// Serialize a timestamp as an ISO string.
pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&to_iso(ts))
}

/// Deserialize a timestamp from an ISO string.
pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_iso(&raw).map_err(serde::de::Error::custom)
}

/// Codec for `Option<DateTime<Utc>>` (`null` when absent).
pub mod option {
    use super::{parse_iso, to_iso};
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize an optional timestamp.
    pub fn serialize<S: Serializer>(
        ts: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match ts {
            Some(ts) => serializer.serialize_str(&to_iso(ts)),
            None => serializer.serialize_none(),
        }
    }

    /// Deserialize an optional timestamp. Empty strings read as `None`.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref() {
            None | Some("") => Ok(None),
            Some(s) => parse_iso(s).map(Some).map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Stamped {
        #[serde(with = "crate::timestamp")]
        at: DateTime<Utc>,
        #[serde(with = "crate::timestamp::option", default)]
        maybe: Option<DateTime<Utc>>,
    }

    #[test]
    fn writes_millisecond_zulu() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        assert_eq!(to_iso(&ts), "2024-05-01T12:00:00.000Z");
    }

    #[test]
    fn reads_offsets_into_utc() {
        let ts = parse_iso("2024-05-01T14:00:00+02:00").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn optional_null_and_empty() {
        let a: Stamped = serde_json::from_str(r#"{"at":"2024-05-01T12:00:00.000Z","maybe":null}"#).unwrap();
        assert!(a.maybe.is_none());
        let b: Stamped = serde_json::from_str(r#"{"at":"2024-05-01T12:00:00.000Z","maybe":""}"#).unwrap();
        assert!(b.maybe.is_none());
        let c: Stamped = serde_json::from_str(r#"{"at":"2024-05-01T12:00:00.000Z"}"#).unwrap();
        assert!(c.maybe.is_none());
    }

    #[test]
    fn optional_serializes_null() {
        let s = Stamped {
            at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            maybe: None,
        };
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["at"], "2024-05-01T12:00:00.000Z");
        assert!(json["maybe"].is_null());
    }

    #[test]
    fn rejects_garbage() {
        let err = serde_json::from_str::<Stamped>(r#"{"at":"yesterday"}"#);
        assert!(err.is_err());
    }
}

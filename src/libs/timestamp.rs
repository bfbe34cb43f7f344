//! Timestamp helpers shared by the store and the export format.
//!
//! Rows keep their timestamps as integer milliseconds in SQLite and as
//! `DateTime<Utc>` in memory. Anything that crosses a boundary (export
//! documents, webhook payloads) is rendered as an ISO-8601 string with
//! millisecond precision, e.g. `2024-05-01T10:00:00.000Z`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serializer};

/// Current time truncated to millisecond precision, matching what SQLite stores.
pub fn now() -> DateTime<Utc> {
    from_millis(Utc::now().timestamp_millis())
}

pub fn to_millis(ts: &DateTime<Utc>) -> i64 {
    ts.timestamp_millis()
}

pub fn from_millis(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).single().unwrap_or_default()
}

/// Renders a timestamp in the canonical wire format.
pub fn to_iso(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses an ISO-8601 timestamp string.
///
/// Strings without a UTC offset (`2024-05-01T10:00:00.000`, `2024-05-01`)
/// are read as UTC.
pub fn parse_iso(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|err| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
                .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f"))
                .or_else(|_| {
                    NaiveDate::parse_from_str(value, "%Y-%m-%d")
                        .map(|date| date.and_hms_opt(0, 0, 0).unwrap_or_default())
                })
                .map(|naive| naive.and_utc())
                .map_err(|_| err)
        })
}

/// Serde adapter: `DateTime<Utc>` <-> ISO string with milliseconds.
pub mod iso {
    use super::*;

    pub fn serialize<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&to_iso(ts))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_iso(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso_has_millis_and_z_suffix() {
        let ts = from_millis(1_714_557_600_123);
        assert_eq!(to_iso(&ts), "2024-05-01T10:00:00.123Z");
    }

    #[test]
    fn test_parse_iso_accepts_offsets() {
        let ts = parse_iso("2024-05-01T12:00:00+02:00").unwrap();
        assert_eq!(to_iso(&ts), "2024-05-01T10:00:00.000Z");
        assert!(parse_iso("yesterday").is_err());
    }

    #[test]
    fn test_parse_iso_without_offset_is_utc() {
        let ts = parse_iso("2024-05-01T10:00:00.123").unwrap();
        assert_eq!(to_iso(&ts), "2024-05-01T10:00:00.123Z");
        let ts = parse_iso("2024-05-01T10:00:00").unwrap();
        assert_eq!(to_iso(&ts), "2024-05-01T10:00:00.000Z");
        let ts = parse_iso("2024-05-01").unwrap();
        assert_eq!(to_iso(&ts), "2024-05-01T00:00:00.000Z");
        assert!(parse_iso("2024-13-01T10:00:00").is_err());
    }

    #[test]
    fn test_now_is_millisecond_aligned() {
        let ts = now();
        assert_eq!(from_millis(to_millis(&ts)), ts);
    }
}

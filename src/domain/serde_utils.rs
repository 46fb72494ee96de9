//! Serde utilities for attachment payloads.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::de::{self, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::{Deserializer, Serializer};
use std::fmt;

/// Epoch values at or above this are milliseconds, not seconds (year 5138 in seconds).
const MILLIS_THRESHOLD: i64 = 100_000_000_000;

/// Converts an epoch number into a UTC timestamp.
/// Values too large to be seconds are read as milliseconds.
#[must_use]
pub fn timestamp_from_epoch(value: i64) -> Option<DateTime<Utc>> {
    if value.unsigned_abs() >= MILLIS_THRESHOLD.unsigned_abs() {
        Utc.timestamp_millis_opt(value).single()
    } else {
        Utc.timestamp_opt(value, 0).single()
    }
}

/// Parses the textual timestamp forms found in attachment records.
///
/// Accepts RFC 3339, a naive `YYYY-MM-DD HH:MM:SS` (read as UTC), and numeric
/// strings holding epoch seconds.
#[must_use]
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }

    if let Ok(seconds) = value.parse::<i64>() {
        return timestamp_from_epoch(seconds);
    }

    value
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .and_then(timestamp_from_float)
}

#[allow(clippy::cast_possible_truncation)]
fn timestamp_from_float(value: f64) -> Option<DateTime<Utc>> {
    if value.abs() >= MILLIS_THRESHOLD as f64 {
        return Utc.timestamp_millis_opt(value as i64).single();
    }
    let seconds = value.floor();
    let nanos = ((value - seconds) * 1e9) as u32;
    Utc.timestamp_opt(seconds as i64, nanos).single()
}

/// Module to handle timestamps that arrive as ISO strings or epoch numbers.
///
/// Deserialization never fails on an unreadable value: it yields `None` so the
/// caller can substitute its own fallback.
pub mod flexible_timestamp {
    use super::{
        DateTime, Deserializer, IgnoredAny, MapAccess, SeqAccess, Serializer, Utc, Visitor, de,
        fmt, parse_timestamp, timestamp_from_epoch, timestamp_from_float,
    };

    /// Serializes an optional timestamp as RFC 3339.
    ///
    /// # Errors
    ///
    /// Returns an error if the serializer fails.
    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => serializer.serialize_str(&dt.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    /// Deserializes a timestamp from a string, an integer or a float.
    ///
    /// # Errors
    ///
    /// Returns an error only if the underlying deserializer fails.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct TimestampVisitor;

        impl<'de> Visitor<'de> for TimestampVisitor {
            type Value = Option<DateTime<Utc>>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("an ISO 8601 string or epoch seconds")
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(timestamp_from_epoch(value))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(i64::try_from(value).ok().and_then(timestamp_from_epoch))
            }

            fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                if value.is_finite() {
                    Ok(timestamp_from_float(value))
                } else {
                    Ok(None)
                }
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(parse_timestamp(value))
            }

            fn visit_bool<E>(self, _value: bool) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(None)
            }

            fn visit_none<E>(self) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(None)
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(None)
            }

            fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                deserializer.deserialize_any(Self)
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
                Ok(None)
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                while seq.next_element::<IgnoredAny>()?.is_some() {}
                Ok(None)
            }
        }

        deserializer.deserialize_any(TimestampVisitor)
    }
}

/// Module to handle identifiers that might be strings or numbers.
pub mod string_or_number {
    use super::{Deserializer, Visitor, de, fmt};

    /// Deserializes an optional identifier, stringifying numbers.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is neither a string nor a number.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct IdVisitor;

        impl<'de> Visitor<'de> for IdVisitor {
            type Value = Option<String>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string or integer identifier")
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Some(value.to_string()))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Some(value.to_string()))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                if value.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(value.to_string()))
                }
            }

            fn visit_none<E>(self) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(None)
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(None)
            }

            fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                deserializer.deserialize_any(Self)
            }
        }

        deserializer.deserialize_any(IdVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, with = "flexible_timestamp")]
        at: Option<DateTime<Utc>>,
        #[serde(default, deserialize_with = "string_or_number::deserialize")]
        id: Option<String>,
    }

    fn probe(json: &str) -> Probe {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_iso_and_epoch_agree() {
        let iso = probe(r#"{"at": "2024-01-02T10:00:00Z"}"#).at.unwrap();
        let secs = probe(r#"{"at": 1704189600}"#).at.unwrap();
        let text_secs = probe(r#"{"at": "1704189600"}"#).at.unwrap();
        assert_eq!(iso, secs);
        assert_eq!(iso, text_secs);
    }

    #[test]
    fn test_millis_are_detected() {
        let millis = probe(r#"{"at": 1704189600000}"#).at.unwrap();
        assert_eq!(millis.timestamp(), 1_704_189_600);
    }

    #[test]
    fn test_fractional_seconds() {
        let at = probe(r#"{"at": 1704189600.5}"#).at.unwrap();
        assert_eq!(at.timestamp(), 1_704_189_600);
        assert_eq!(at.timestamp_subsec_millis(), 500);
    }

    #[test]
    fn test_naive_string_is_utc() {
        let at = probe(r#"{"at": "2024-01-02 10:00:00"}"#).at.unwrap();
        assert_eq!(at.to_rfc3339(), "2024-01-02T10:00:00+00:00");
    }

    #[test]
    fn test_garbage_yields_none() {
        assert!(probe(r#"{"at": "not a date"}"#).at.is_none());
        assert!(probe(r#"{"at": null}"#).at.is_none());
        assert!(probe(r#"{"at": true}"#).at.is_none());
        assert!(probe("{}").at.is_none());
    }

    #[test]
    fn test_structured_timestamp_yields_none() {
        assert!(probe(r#"{"at": {"seconds": 1, "nanos": 0}}"#).at.is_none());
        assert!(probe(r#"{"at": [1704189600, 0]}"#).at.is_none());

        let both: Vec<Probe> =
            serde_json::from_str(r#"[{"at": {"seconds": 1}, "id": "a"}, {"at": 1704189600, "id": "b"}]"#)
                .unwrap();
        assert!(both[0].at.is_none());
        assert_eq!(both[1].at.map(|at| at.timestamp()), Some(1_704_189_600));
    }

    #[test]
    fn test_extreme_epoch_values_yield_none() {
        assert!(timestamp_from_epoch(i64::MIN).is_none());
        assert!(timestamp_from_epoch(i64::MAX).is_none());
        assert!(probe(r#"{"at": -9223372036854775808}"#).at.is_none());
        assert!(probe(r#"{"at": "-9223372036854775808"}"#).at.is_none());
    }

    #[test]
    fn test_numeric_ids_are_stringified() {
        assert_eq!(probe(r#"{"id": 42}"#).id.as_deref(), Some("42"));
        assert_eq!(probe(r#"{"id": "abc"}"#).id.as_deref(), Some("abc"));
        assert!(probe(r#"{"id": ""}"#).id.is_none());
    }
}

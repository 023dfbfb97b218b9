//! Wire timestamps.
//!
//! The service emits ISO 8601 strings, but older payloads (and values that
//! round-tripped through Python's `str(datetime)`) use a space instead of
//! `T` between date and time. Both forms are accepted; naive values are
//! taken as UTC. Formatting always produces RFC 3339 with the stored offset.

use chrono::{DateTime, FixedOffset, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serializer};

use crate::{Error, Result};

/// In-memory form of a timestamp field.
pub type Timestamp = DateTime<FixedOffset>;

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parses a wire timestamp.
pub fn parse(s: &str) -> Result<Timestamp> {
    let s = s.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts);
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(ts) = DateTime::parse_from_str(s, fmt) {
            return Ok(ts);
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(naive.and_utc().fixed_offset());
        }
    }
    Err(Error::InvalidTimestamp(s.to_string()))
}

/// Formats a timestamp for the wire.
#[must_use]
pub fn format(ts: &Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

/// Current time as a wire-compatible timestamp.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now().fixed_offset()
}

/// Serde `deserialize_with` for optional timestamp fields of plain structs.
///
/// Accepts every form [`parse`] does; `null` and `""` read as `None`.
pub fn deserialize_lenient<'de, D>(deserializer: D) -> std::result::Result<Option<Timestamp>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(s) if !s.trim().is_empty() => parse(&s).map(Some).map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

/// Serde `serialize_with` counterpart of [`deserialize_lenient`].
pub fn serialize_optional<S>(
    value: &Option<Timestamp>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(ts) => serializer.serialize_str(&format(ts)),
        None => serializer.serialize_none(),
    }
}

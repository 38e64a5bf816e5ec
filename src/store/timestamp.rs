//! Stored timestamp format.
//!
//! Instants are kept in UTC with fixed microsecond precision
//! (`2025-06-01T08:30:00.000000Z`), so string order equals time order and
//! the store can sort on them without knowing they are dates.

use serde::{de::Error as _, ser::Error as _, Deserialize, Deserializer, Serializer};
use time::{
    format_description::well_known::Rfc3339, macros::format_description, OffsetDateTime,
    PrimitiveDateTime, UtcOffset,
};

/// Current instant truncated to what the stored format keeps.
pub fn now() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();
    now.replace_nanosecond(now.microsecond() * 1_000)
        .unwrap_or(now)
}

pub fn format(ts: OffsetDateTime) -> Result<String, time::error::Format> {
    ts.to_offset(UtcOffset::UTC).format(format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6]Z"
    ))
}

pub fn parse(raw: &str) -> Result<OffsetDateTime, time::error::Parse> {
    PrimitiveDateTime::parse(
        raw,
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6]Z"),
    )
    .map(PrimitiveDateTime::assume_utc)
    .or_else(|_| OffsetDateTime::parse(raw, &Rfc3339))
}

pub fn to_value(ts: OffsetDateTime) -> Result<serde_json::Value, time::error::Format> {
    format(ts).map(serde_json::Value::String)
}

pub fn serialize<S: Serializer>(ts: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error> {
    let raw = format(*ts).map_err(S::Error::custom)?;
    serializer.serialize_str(&raw)
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<OffsetDateTime, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse(&raw).map_err(D::Error::custom)
}

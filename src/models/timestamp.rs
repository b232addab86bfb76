//! # Delivery Timestamps

//! Shipments carry their delivery instants as local wall-clock `NaiveDateTime`s.
//! The backend speaks ISO-8601: RFC 3339 strings with an offset are converted into local time,
//! naive date-times are taken as already local, and `null` or an empty string means "not set".
//! A value that cannot be parsed is also "not set", so one bad record never blocks a whole load.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone};
use serde::{Deserialize, Deserializer, Serializer};
use tracing::warn;
use crate::errors::{BoardError, BoardResult};

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parses a wire timestamp into local time.
pub fn parse_timestamp(raw: &str) -> BoardResult<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Local).naive_local());
    }
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| BoardError::InvalidTimestamp(raw.to_string()))
}

/// Renders a local delivery instant as an RFC 3339 string with the local offset.
///
/// Wall-clock times that do not exist locally (a DST gap) are rejected; ambiguous
/// times resolve to the earlier instant.
pub fn to_wire_timestamp(value: &NaiveDateTime) -> BoardResult<String> {
    Local
        .from_local_datetime(value)
        .earliest()
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, false))
        .ok_or_else(|| BoardError::InvalidTimestamp(format!("{} does not exist in local time", value)))
}

/// Serde adapter for `Option<NaiveDateTime>` fields.
pub mod optional {
    use super::*;

    /// Unparsable values are logged and read as `None`.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
        where
            D: Deserializer<'de>,
    {
        let opt: Option<String> = Option::deserialize(deserializer)?;
        match opt.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => match parse_timestamp(raw) {
                Ok(dt) => Ok(Some(dt)),
                Err(e) => {
                    warn!("Ignoring unreadable timestamp: {}", e);
                    Ok(None)
                }
            },
        }
    }

    pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
    {
        match value {
            Some(dt) => serializer.serialize_some(&dt.format("%Y-%m-%dT%H:%M:%S").to_string()),
            None => serializer.serialize_none(),
        }
    }
}

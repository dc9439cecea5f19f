use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};

/// Timestamp layout used by the scheduler API, e.g. `2017-12-22T15:15`.
pub const SLOT_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Human-readable layout for qualifying slots, e.g. `Monday, January 05 @ 09:15AM`.
pub const SLOT_DISPLAY_FORMAT: &str = "%A, %B %d @ %I:%M%p";

/// Identifier of an enrollment location.
///
/// The scheduler publishes numeric ids while configuration files often quote
/// them, so both forms deserialize into the same normalized string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LocationId(pub String);

impl LocationId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u32> for LocationId {
    fn from(value: u32) -> Self {
        Self(value.to_string())
    }
}

impl From<&str> for LocationId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl<'de> Deserialize<'de> for LocationId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Number(u64),
            Text(String),
        }

        match RawId::deserialize(deserializer)? {
            RawId::Number(value) => Ok(Self(value.to_string())),
            RawId::Text(value) if value.trim().is_empty() => {
                Err(serde::de::Error::custom("location id must not be empty"))
            }
            RawId::Text(value) => Ok(Self::new(value)),
        }
    }
}

/// Slot record as published by the scheduler API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawSlot {
    #[serde(rename = "startTimestamp", deserialize_with = "deserialize_timestamp")]
    pub start: NaiveDateTime,
    pub active: bool,
}

impl RawSlot {
    pub fn display(&self) -> String {
        format_slot(self.start)
    }
}

/// Renders a slot start time the way notifications and logs show it.
pub fn format_slot(start: NaiveDateTime) -> String {
    start.format(SLOT_DISPLAY_FORMAT).to_string()
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(raw.trim(), SLOT_TIMESTAMP_FORMAT)
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(|err| {
        serde::de::Error::custom(format!(
            "failed to parse '{raw}' as {SLOT_TIMESTAMP_FORMAT} ({err})"
        ))
    })
}

/// Result of a successful fetch against the slot source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Slots(Vec<RawSlot>),
    /// The scheduler reported no openings at all.
    Empty,
}

impl FetchOutcome {
    pub fn into_slots(self) -> Vec<RawSlot> {
        match self {
            FetchOutcome::Slots(slots) => slots,
            FetchOutcome::Empty => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn location_ids_accept_numbers_and_strings() {
        let ids: Vec<LocationId> =
            serde_json::from_str(r#"[5140, " 5446 "]"#).expect("ids deserialize");
        assert_eq!(ids, vec![LocationId::from(5140), LocationId::from("5446")]);
    }

    #[test]
    fn blank_location_ids_are_rejected() {
        let parsed = serde_json::from_str::<LocationId>(r#""  ""#);
        assert!(parsed.is_err());
    }

    #[test]
    fn raw_slot_parses_scheduler_timestamps() {
        let slot: RawSlot =
            serde_json::from_str(r#"{"startTimestamp": "2017-12-22T15:15", "active": true}"#)
                .expect("slot parses");
        let expected = NaiveDate::from_ymd_opt(2017, 12, 22)
            .and_then(|date| date.and_hms_opt(15, 15, 0))
            .expect("valid timestamp");
        assert_eq!(slot.start, expected);
        assert!(slot.active);
    }

    #[test]
    fn display_format_matches_notification_layout() {
        let start = NaiveDate::from_ymd_opt(2026, 1, 5)
            .and_then(|date| date.and_hms_opt(9, 15, 0))
            .expect("valid timestamp");
        assert_eq!(format_slot(start), "Monday, January 05 @ 09:15AM");

        let afternoon = NaiveDate::from_ymd_opt(2026, 1, 7)
            .and_then(|date| date.and_hms_opt(13, 0, 0))
            .expect("valid timestamp");
        assert_eq!(format_slot(afternoon), "Wednesday, January 07 @ 01:00PM");
    }
}

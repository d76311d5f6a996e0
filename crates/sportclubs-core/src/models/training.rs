use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::null_as_default;

/// A scheduled session of a group. Timestamps are kept as received and
/// parsed on demand so that one bad record doesn't fail the whole response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Training {
    pub id: i64,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
    pub training_class: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub group_accredited: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub can_grade: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub can_check_in: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub checked_in: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub participants: Participants,
    #[serde(default, deserialize_with = "null_as_default")]
    pub capacity: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub available_spots: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Participants {
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_checked_in: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub students: Vec<Student>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub medical_group: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub hours: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub attended: bool,
}

/// Parse an API timestamp. RFC 3339 is expected; an ISO timestamp without
/// an offset is read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt);
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc().fixed_offset())
}

impl Training {
    pub fn start_time(&self) -> Option<DateTime<FixedOffset>> {
        self.start.as_deref().and_then(parse_timestamp)
    }

    pub fn end_time(&self) -> Option<DateTime<FixedOffset>> {
        self.end.as_deref().and_then(parse_timestamp)
    }

    /// Class label, `None` when absent or empty
    pub fn class_label(&self) -> Option<&str> {
        self.training_class.as_deref().filter(|c| !c.is_empty())
    }
}

//! Data models for the sport service.
//!
//! This module contains the data structures returned by the API:
//!
//! - `Club`, `Group`, `Trainer`: clubs and their sub-cohorts
//! - `Training`, `Participants`, `Student`: scheduled sessions and rosters
//! - `FaqEntries`: question -> answer map

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};

pub mod club;
pub mod training;

pub use club::{Club, Group, Trainer};
pub use training::{parse_timestamp, Participants, Student, Training};

/// FAQ entries keyed by question
pub type FaqEntries = BTreeMap<String, String>;

/// Deserialize an explicit `null` the same way as a missing field.
/// Use together with `#[serde(default)]`.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

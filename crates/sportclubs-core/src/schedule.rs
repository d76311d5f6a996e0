//! Upcoming-training aggregation.
//!
//! Flattens the trainings of a club's groups into a single list of sessions
//! that have not ended yet, ordered by start time.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::{Club, Group};

/// Number of upcoming sessions shown per club
pub const DEFAULT_UPCOMING_LIMIT: usize = 10;

/// Label used when a training has no class
pub const DEFAULT_TRAINING_LABEL: &str = "Training";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpcomingSession {
    pub id: i64,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub training_class: String,
    pub available_spots: i64,
}

/// Collect the sessions of `groups` whose end is strictly after `now`,
/// sorted by start and truncated to `limit`.
///
/// Sessions already in progress are included. Equal starts keep their
/// input order. Trainings with unparseable timestamps are skipped.
pub fn upcoming_sessions(groups: &[Group], now: DateTime<Utc>, limit: usize) -> Vec<UpcomingSession> {
    let mut sessions: Vec<UpcomingSession> = groups
        .iter()
        .flat_map(|group| group.trainings.iter())
        .filter_map(|training| {
            let (Some(start), Some(end)) = (training.start_time(), training.end_time()) else {
                warn!(
                    training_id = training.id,
                    start = ?training.start,
                    end = ?training.end,
                    "Skipping training with invalid timestamps"
                );
                return None;
            };
            if end <= now {
                return None;
            }
            Some(UpcomingSession {
                id: training.id,
                start,
                end,
                training_class: training
                    .class_label()
                    .unwrap_or(DEFAULT_TRAINING_LABEL)
                    .to_string(),
                available_spots: training.available_spots,
            })
        })
        .collect();

    // Stable: ties keep input order
    sessions.sort_by_key(|s| s.start);
    sessions.truncate(limit);
    sessions
}

impl Club {
    /// Upcoming sessions across all groups of this club
    pub fn upcoming_sessions(&self, now: DateTime<Utc>, limit: usize) -> Vec<UpcomingSession> {
        upcoming_sessions(&self.groups, now, limit)
    }
}

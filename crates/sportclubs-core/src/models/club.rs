use serde::{Deserialize, Serialize};

use super::{null_as_default, Training};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Club {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub groups: Vec<Group>,
    // As reported by the server; not checked against `groups.len()`
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_groups: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub capacity: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub current_enrollment: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_club: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub accredited: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub trainings: Vec<Training>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub trainers: Vec<Trainer>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub allowed_medical_groups: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trainer {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
}

impl Group {
    /// Free places left in the group, never negative
    pub fn spots_left(&self) -> i64 {
        (self.capacity - self.current_enrollment).max(0)
    }

    pub fn is_full(&self) -> bool {
        self.spots_left() == 0
    }

    pub fn trainer_names(&self) -> Vec<&str> {
        self.trainers.iter().map(|t| t.name.as_str()).collect()
    }
}

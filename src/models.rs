//! Data models for participants and gift assignments

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A person registered for the gift exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub joined_at: DateTime<Utc>,
}

impl Participant {
    /// Build a participant from already-trimmed, non-empty fields
    pub(crate) fn new(id: Uuid, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            joined_at: Utc::now(),
        }
    }
}

/// A directed pairing: `giver_id` buys a gift for `receiver_id`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Assignment {
    pub giver_id: Uuid,
    pub receiver_id: Uuid,
}

impl Assignment {
    pub fn new(giver_id: Uuid, receiver_id: Uuid) -> Self {
        Self {
            giver_id,
            receiver_id,
        }
    }

    /// Whether this record names `id` on either side
    pub fn references(&self, id: Uuid) -> bool {
        self.giver_id == id || self.receiver_id == id
    }
}

/// The current assignment set together with the time it was drawn
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draw {
    pub assignments: Vec<Assignment>,
    pub drawn_at: Option<DateTime<Utc>>,
}

impl Draw {
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

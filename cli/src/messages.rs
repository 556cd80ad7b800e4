//! WebSocket message types for the Secret Santa protocol
//!
//! These types mirror the server's protocol.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub joined_at: DateTime<Utc>,
}

/// A giver -> receiver pairing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub giver_id: Uuid,
    pub receiver_id: Uuid,
}

/// Messages from client to server
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Register a participant
    AddParticipant { name: String, email: String },
    /// Remove a participant
    RemoveParticipant { participant_id: Uuid },
    /// List participants
    ListParticipants,
    /// Draw assignments
    Assign,
    /// Fetch the current assignments
    GetAssignments,
    /// Resolve a giver's recipient
    LookupReceiver { giver_id: Uuid },
}

/// A change made to the session by another client
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Change {
    ParticipantAdded {
        participant: Participant,
    },
    ParticipantRemoved {
        participant_id: Uuid,
        invalidated: Vec<Assignment>,
    },
    Assigned {
        assignments: Vec<Assignment>,
        drawn_at: Option<DateTime<Utc>>,
    },
}

/// Messages from server to client
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Participant was registered
    ParticipantAdded { participant: Participant },
    /// Participant was removed
    ParticipantRemoved {
        participant_id: Uuid,
        invalidated: Vec<Assignment>,
    },
    /// Current participant list
    Participants { participants: Vec<Participant> },
    /// A new draw replaced the assignment set
    Assigned {
        assignments: Vec<Assignment>,
        drawn_at: Option<DateTime<Utc>>,
    },
    /// Current assignment set
    Assignments {
        assignments: Vec<Assignment>,
        drawn_at: Option<DateTime<Utc>>,
    },
    /// Recipient for a giver
    Receiver {
        giver_id: Uuid,
        receiver: Option<Participant>,
    },
    /// Pushed when another client changes the session
    SessionChanged { change: Change },
    /// Error occurred
    Error { message: String },
}

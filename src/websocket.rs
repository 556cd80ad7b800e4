//! WebSocket server handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Assignment, Participant};
use crate::store::{Change, Outcome};
use crate::AppState;

/// WebSocket handler
pub async fn handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let connection_id = Uuid::new_v4();
    let (mut sender, mut receiver) = socket.split();
    let mut events = state.store.subscribe();

    tracing::debug!(%connection_id, "client connected");

    loop {
        tokio::select! {
            msg = receiver.next() => {
                let Some(msg) = msg else { break };
                let msg = match msg {
                    Ok(Message::Text(text)) => text,
                    Ok(Message::Close(_)) => break,
                    Ok(_) => continue,
                    Err(e) => {
                        tracing::error!("WebSocket error: {}", e);
                        break;
                    }
                };

                let reply = match serde_json::from_str::<ClientMessage>(&msg) {
                    Ok(client_msg) => handle_message(&state, connection_id, client_msg).await,
                    Err(e) => ServerMessage::Error {
                        message: format!("Invalid message: {}", e),
                    },
                };

                if let Err(e) = send_message(&mut sender, &reply).await {
                    tracing::error!("Failed to send reply: {}", e);
                    break;
                }
            }
            event = events.recv() => {
                let outgoing = match event {
                    // The originating connection already has the direct reply
                    Ok(event) if event.source == Some(connection_id) => continue,
                    Ok(event) => vec![ServerMessage::SessionChanged {
                        change: event.change,
                    }],
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(%connection_id, skipped, "client lagged, resending state");
                        resync(&state).await
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };

                let mut failed = false;
                for msg in &outgoing {
                    if let Err(e) = send_message(&mut sender, msg).await {
                        tracing::error!("Failed to forward change: {}", e);
                        failed = true;
                        break;
                    }
                }
                if failed {
                    break;
                }
            }
        }
    }

    tracing::debug!(%connection_id, "client disconnected");
}

/// Full state for a client that missed changes
async fn resync(state: &AppState) -> Vec<ServerMessage> {
    let (participants, draw) = state.store.snapshot().await;
    vec![
        ServerMessage::Participants { participants },
        ServerMessage::Assignments {
            assignments: draw.assignments,
            drawn_at: draw.drawn_at,
        },
    ]
}

/// Serialize a reply into a text frame.
///
/// A message that fails to serialize is logged and dropped; the connection
/// stays open.
fn encode(msg: &ServerMessage) -> Option<Message> {
    match serde_json::to_string(msg) {
        Ok(json) => Some(Message::Text(json)),
        Err(e) => {
            tracing::error!("Failed to serialize reply: {}", e);
            None
        }
    }
}

/// Send one message; only a failed write is reported as an error
async fn send_message(
    sender: &mut futures::stream::SplitSink<WebSocket, Message>,
    msg: &ServerMessage,
) -> crate::error::Result<()> {
    let Some(frame) = encode(msg) else {
        return Ok(());
    };
    sender
        .send(frame)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))
}

/// Apply one client message to the store and build the reply.
///
/// `source` identifies the connection so that its own changes are not
/// echoed back to it as broadcasts.
pub async fn handle_message(state: &AppState, source: Uuid, msg: ClientMessage) -> ServerMessage {
    match msg {
        ClientMessage::AddParticipant { name, email } => {
            match state.store.add_participant(Some(source), &name, &email).await {
                Outcome::Applied(participant) => ServerMessage::ParticipantAdded { participant },
                Outcome::Unchanged(participants) => ServerMessage::Participants { participants },
            }
        }
        ClientMessage::RemoveParticipant { participant_id } => {
            match state.store.remove_participant(Some(source), participant_id).await {
                Outcome::Applied(removal) => ServerMessage::ParticipantRemoved {
                    participant_id,
                    invalidated: removal.invalidated,
                },
                Outcome::Unchanged(participants) => ServerMessage::Participants { participants },
            }
        }
        ClientMessage::ListParticipants => ServerMessage::Participants {
            participants: state.store.list_participants().await,
        },
        ClientMessage::Assign => match state.store.assign(Some(source)).await {
            Ok(draw) => ServerMessage::Assigned {
                assignments: draw.assignments,
                drawn_at: draw.drawn_at,
            },
            Err(e) => ServerMessage::Error {
                message: e.to_string(),
            },
        },
        ClientMessage::GetAssignments => {
            let draw = state.store.draw().await;
            ServerMessage::Assignments {
                assignments: draw.assignments,
                drawn_at: draw.drawn_at,
            }
        }
        ClientMessage::LookupReceiver { giver_id } => ServerMessage::Receiver {
            giver_id,
            receiver: state.store.lookup_receiver(giver_id).await,
        },
    }
}

/// Messages from client to server
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Register a participant
    AddParticipant { name: String, email: String },
    /// Remove a participant and any assignment naming them
    RemoveParticipant { participant_id: Uuid },
    /// List participants in insertion order
    ListParticipants,
    /// Draw a fresh set of assignments
    Assign,
    /// Fetch the current assignment set
    GetAssignments,
    /// Resolve a giver's recipient
    LookupReceiver { giver_id: Uuid },
}

/// Messages from server to client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Participant was registered
    ParticipantAdded { participant: Participant },
    /// Participant was removed, along with the records that named them
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
    /// Recipient for a giver, if any
    Receiver {
        giver_id: Uuid,
        receiver: Option<Participant>,
    },
    /// A change made by another connection
    SessionChanged { change: Change },
    /// Error occurred
    Error { message: String },
}

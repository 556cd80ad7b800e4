//! WebSocket client for the Secret Santa server

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use uuid::Uuid;

use crate::messages::{Assignment, ClientMessage, Participant, ServerMessage};

/// WebSocket client for the Secret Santa server
pub struct SantaClient {
    tx: mpsc::Sender<Message>,
    rx: mpsc::Receiver<ServerMessage>,
    #[allow(dead_code)]
    handle: tokio::task::JoinHandle<()>,
}

impl SantaClient {
    /// Connect to a Secret Santa server
    pub async fn connect(url: &str) -> Result<Self> {
        tracing::info!("Connecting to {}", url);

        let (ws_stream, _) = connect_async(url).await?;
        let (mut write, mut read) = ws_stream.split();

        // Channel for outgoing messages
        let (out_tx, mut out_rx) = mpsc::channel::<Message>(32);

        // Channel for incoming parsed messages
        let (in_tx, in_rx) = mpsc::channel::<ServerMessage>(32);

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    Some(msg) = out_rx.recv() => {
                        if write.send(msg).await.is_err() {
                            break;
                        }
                    }
                    Some(result) = read.next() => {
                        match result {
                            Ok(Message::Text(text)) => {
                                match serde_json::from_str::<ServerMessage>(&text) {
                                    Ok(msg) => {
                                        if in_tx.send(msg).await.is_err() {
                                            break;
                                        }
                                    }
                                    Err(e) => {
                                        tracing::warn!("Failed to parse message: {} - {}", e, text);
                                    }
                                }
                            }
                            Ok(Message::Close(_)) => break,
                            Err(e) => {
                                tracing::error!("WebSocket error: {}", e);
                                break;
                            }
                            _ => {}
                        }
                    }
                    else => break,
                }
            }
        });

        tracing::info!("Connected successfully");

        Ok(Self {
            tx: out_tx,
            rx: in_rx,
            handle,
        })
    }

    /// Send a message to the server without waiting for the reply
    pub async fn send(&self, msg: ClientMessage) -> Result<()> {
        let json = serde_json::to_string(&msg)?;
        self.tx
            .send(Message::Text(json))
            .await
            .map_err(|e| anyhow!("Failed to send message: {}", e))
    }

    /// Receive a message from the server
    pub async fn recv(&mut self) -> Option<ServerMessage> {
        self.rx.recv().await
    }

    /// Try to receive a message without blocking
    pub fn try_recv(&mut self) -> Option<ServerMessage> {
        self.rx.try_recv().ok()
    }

    /// Send `msg` and wait for the first reply `pick` accepts.
    ///
    /// A server `error` reply ends the wait with an error. Changes pushed
    /// on behalf of other clients are skipped.
    async fn request<T, F>(&mut self, msg: ClientMessage, mut pick: F) -> Result<T>
    where
        F: FnMut(ServerMessage) -> Option<T>,
    {
        self.send(msg).await?;

        while let Some(msg) = self.recv().await {
            if let ServerMessage::Error { message } = msg {
                return Err(anyhow!("Server error: {}", message));
            }
            if let Some(value) = pick(msg) {
                return Ok(value);
            }
        }

        Err(anyhow!("Connection closed"))
    }

    /// Register a participant; `None` when the server ignored blank input
    pub async fn add_participant(
        &mut self,
        name: &str,
        email: &str,
    ) -> Result<Option<Participant>> {
        let msg = ClientMessage::AddParticipant {
            name: name.to_string(),
            email: email.to_string(),
        };
        self.request(msg, |reply| match reply {
            ServerMessage::ParticipantAdded { participant } => Some(Some(participant)),
            ServerMessage::Participants { .. } => Some(None),
            _ => None,
        })
        .await
    }

    /// Remove a participant; returns the invalidated assignments, or `None`
    /// when no such participant was registered
    pub async fn remove_participant(
        &mut self,
        participant_id: Uuid,
    ) -> Result<Option<Vec<Assignment>>> {
        self.request(
            ClientMessage::RemoveParticipant { participant_id },
            |reply| match reply {
                ServerMessage::ParticipantRemoved { invalidated, .. } => Some(Some(invalidated)),
                ServerMessage::Participants { .. } => Some(None),
                _ => None,
            },
        )
        .await
    }

    /// List participants in insertion order
    pub async fn list_participants(&mut self) -> Result<Vec<Participant>> {
        self.request(ClientMessage::ListParticipants, |reply| match reply {
            ServerMessage::Participants { participants } => Some(participants),
            _ => None,
        })
        .await
    }

    /// Draw a fresh set of assignments
    pub async fn assign(&mut self) -> Result<(Vec<Assignment>, Option<DateTime<Utc>>)> {
        self.request(ClientMessage::Assign, |reply| match reply {
            ServerMessage::Assigned {
                assignments,
                drawn_at,
            } => Some((assignments, drawn_at)),
            _ => None,
        })
        .await
    }

    /// Fetch the current assignment set
    pub async fn assignments(&mut self) -> Result<(Vec<Assignment>, Option<DateTime<Utc>>)> {
        self.request(ClientMessage::GetAssignments, |reply| match reply {
            ServerMessage::Assignments {
                assignments,
                drawn_at,
            } => Some((assignments, drawn_at)),
            _ => None,
        })
        .await
    }

    /// Resolve who `giver_id` buys for
    pub async fn lookup_receiver(&mut self, giver_id: Uuid) -> Result<Option<Participant>> {
        self.request(ClientMessage::LookupReceiver { giver_id }, |reply| match reply {
            ServerMessage::Receiver { receiver, .. } => Some(receiver),
            _ => None,
        })
        .await
    }
}

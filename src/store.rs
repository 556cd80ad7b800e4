//! In-memory store for the running session
//!
//! Wraps [`Session`] behind a lock so that socket and HTTP handlers apply
//! events one at a time in arrival order. Every applied change is also
//! published on a broadcast channel so that other connections can follow
//! along. Nothing is persisted; a restart starts from an empty registry.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Assignment, Draw, Participant};
use crate::session::{Removal, Session};

/// A change applied to the session
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Change {
    /// A participant was registered
    ParticipantAdded { participant: Participant },
    /// A participant was removed, along with the records that named them
    ParticipantRemoved {
        participant_id: Uuid,
        invalidated: Vec<Assignment>,
    },
    /// A new draw replaced the assignment set
    Assigned {
        assignments: Vec<Assignment>,
        drawn_at: Option<DateTime<Utc>>,
    },
}

/// A change together with the connection that caused it
#[derive(Debug, Clone)]
pub struct StoreEvent {
    /// The connection that made the change (None for server-originated)
    pub source: Option<Uuid>,
    pub change: Change,
}

/// Result of a mutation the session may ignore
#[derive(Debug)]
pub enum Outcome<T> {
    Applied(T),
    /// Nothing changed; the participant list as read under the same lock
    Unchanged(Vec<Participant>),
}

impl<T> Outcome<T> {
    pub fn applied(self) -> Option<T> {
        match self {
            Outcome::Applied(value) => Some(value),
            Outcome::Unchanged(_) => None,
        }
    }
}

pub struct Store {
    session: RwLock<Session>,
    event_tx: broadcast::Sender<StoreEvent>,
}

impl Default for Store {
    fn default() -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self {
            session: RwLock::new(Session::default()),
            event_tx,
        }
    }
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to changes applied from now on
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.event_tx.subscribe()
    }

    // Sent while the write lock is held so subscribers see changes in the
    // order they were applied.
    fn publish(&self, source: Option<Uuid>, change: Change) {
        let _ = self.event_tx.send(StoreEvent { source, change });
    }

    // Participant operations

    pub async fn add_participant(
        &self,
        source: Option<Uuid>,
        name: &str,
        email: &str,
    ) -> Outcome<Participant> {
        let mut session = self.session.write().await;
        match session.add_participant(name, email) {
            Some(participant) => {
                tracing::info!(
                    participant_id = %participant.id,
                    name = %participant.name,
                    "participant added"
                );
                self.publish(
                    source,
                    Change::ParticipantAdded {
                        participant: participant.clone(),
                    },
                );
                Outcome::Applied(participant)
            }
            None => {
                tracing::debug!("ignored participant with empty name or email");
                Outcome::Unchanged(session.participants().to_vec())
            }
        }
    }

    pub async fn remove_participant(&self, source: Option<Uuid>, id: Uuid) -> Outcome<Removal> {
        let mut session = self.session.write().await;
        match session.remove_participant(id) {
            Some(removal) => {
                tracing::info!(
                    participant_id = %id,
                    invalidated = removal.invalidated.len(),
                    "participant removed"
                );
                self.publish(
                    source,
                    Change::ParticipantRemoved {
                        participant_id: id,
                        invalidated: removal.invalidated.clone(),
                    },
                );
                Outcome::Applied(removal)
            }
            None => {
                tracing::debug!(participant_id = %id, "remove for unknown participant");
                Outcome::Unchanged(session.participants().to_vec())
            }
        }
    }

    pub async fn list_participants(&self) -> Vec<Participant> {
        self.session.read().await.participants().to_vec()
    }

    // Assignment operations

    pub async fn assign(&self, source: Option<Uuid>) -> Result<Draw> {
        let mut session = self.session.write().await;
        match session.assign() {
            Ok(draw) => {
                tracing::info!(count = draw.assignments.len(), "secret santas assigned");
                self.publish(
                    source,
                    Change::Assigned {
                        assignments: draw.assignments.clone(),
                        drawn_at: draw.drawn_at,
                    },
                );
                Ok(draw)
            }
            Err(e) => {
                tracing::warn!("assign refused: {}", e);
                Err(e.into())
            }
        }
    }

    pub async fn draw(&self) -> Draw {
        self.session.read().await.draw()
    }

    /// Participants and assignments as of one moment
    pub async fn snapshot(&self) -> (Vec<Participant>, Draw) {
        let session = self.session.read().await;
        (session.participants().to_vec(), session.draw())
    }

    pub async fn lookup_receiver(&self, giver_id: Uuid) -> Option<Participant> {
        self.session.read().await.receiver_for(giver_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    async fn add(store: &Store, name: &str) -> Participant {
        let email = format!("{}@example.com", name.to_lowercase());
        store.add_participant(None, name, &email).await.applied().unwrap()
    }

    #[tokio::test]
    async fn test_add_and_list() {
        let store = Store::new();
        add(&store, "Alice").await;
        add(&store, "Bob").await;

        let names: Vec<String> = store
            .list_participants()
            .await
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Alice", "Bob"]);
    }

    #[tokio::test]
    async fn test_add_rejects_blank() {
        let store = Store::new();
        let outcome = store.add_participant(None, "  ", "x@example.com").await;
        assert!(outcome.applied().is_none());
        assert!(store.list_participants().await.is_empty());
    }

    #[tokio::test]
    async fn test_rejected_add_returns_current_list() {
        let store = Store::new();
        let alice = add(&store, "Alice").await;

        match store.add_participant(None, "Bob", " ").await {
            Outcome::Unchanged(participants) => assert_eq!(participants, vec![alice]),
            Outcome::Applied(p) => panic!("Expected Unchanged, got {:?}", p),
        }
    }

    #[tokio::test]
    async fn test_unknown_remove_returns_current_list() {
        let store = Store::new();
        let alice = add(&store, "Alice").await;

        match store.remove_participant(None, Uuid::new_v4()).await {
            Outcome::Unchanged(participants) => assert_eq!(participants, vec![alice]),
            Outcome::Applied(r) => panic!("Expected Unchanged, got {:?}", r.participant),
        }
    }

    #[tokio::test]
    async fn test_assign_requires_two() {
        let store = Store::new();
        add(&store, "Alice").await;

        let err = store.assign(None).await.unwrap_err();
        assert!(matches!(err, AppError::InsufficientParticipants(_)));
        assert!(store.draw().await.is_empty());
    }

    #[tokio::test]
    async fn test_assign_and_lookup() {
        let store = Store::new();
        let alice = add(&store, "Alice").await;
        let bob = add(&store, "Bob").await;

        let draw = store.assign(None).await.unwrap();
        assert_eq!(draw.assignments.len(), 2);
        assert!(draw.drawn_at.is_some());

        let receiver = store.lookup_receiver(alice.id).await.unwrap();
        assert_eq!(receiver.id, bob.id);
    }

    #[tokio::test]
    async fn test_remove_cascades() {
        let store = Store::new();
        let alice = add(&store, "Alice").await;
        add(&store, "Bob").await;
        store.assign(None).await.unwrap();

        let removal = store.remove_participant(None, alice.id).await.applied().unwrap();
        assert_eq!(removal.invalidated.len(), 2);
        assert!(store.draw().await.is_empty());
        assert!(store
            .remove_participant(None, alice.id)
            .await
            .applied()
            .is_none());
    }

    #[tokio::test]
    async fn test_changes_are_published_in_order() {
        let store = Store::new();
        let mut rx = store.subscribe();
        let source = Uuid::new_v4();

        let alice = store
            .add_participant(Some(source), "Alice", "alice@example.com")
            .await
            .applied()
            .unwrap();
        add(&store, "Bob").await;
        let draw = store.assign(Some(source)).await.unwrap();
        store.remove_participant(None, alice.id).await;

        let event = rx.recv().await.unwrap();
        assert_eq!(event.source, Some(source));
        assert_eq!(
            event.change,
            Change::ParticipantAdded {
                participant: alice.clone()
            }
        );

        let event = rx.recv().await.unwrap();
        assert_eq!(event.source, None);
        assert!(matches!(event.change, Change::ParticipantAdded { .. }));

        let event = rx.recv().await.unwrap();
        assert_eq!(
            event.change,
            Change::Assigned {
                assignments: draw.assignments.clone(),
                drawn_at: draw.drawn_at,
            }
        );

        match rx.recv().await.unwrap().change {
            Change::ParticipantRemoved {
                participant_id,
                invalidated,
            } => {
                assert_eq!(participant_id, alice.id);
                assert_eq!(invalidated.len(), 2);
            }
            other => panic!("Expected ParticipantRemoved, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_ignored_changes_are_not_published() {
        let store = Store::new();
        let mut rx = store.subscribe();

        store.add_participant(None, "", "").await;
        store.remove_participant(None, Uuid::new_v4()).await;
        assert!(store.assign(None).await.is_err());

        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }
}

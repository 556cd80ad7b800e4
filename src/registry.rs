//! Participant registry
//!
//! Holds participants in insertion order and hands out unique ids.

use uuid::Uuid;

use crate::models::Participant;

/// Ordered collection of registered participants
#[derive(Debug, Default, Clone)]
pub struct Registry {
    participants: Vec<Participant>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a participant.
    ///
    /// Both fields are trimmed; if either is empty afterwards the call is a
    /// no-op and returns `None`.
    pub fn add(&mut self, name: &str, email: &str) -> Option<Participant> {
        let name = name.trim();
        let email = email.trim();
        if name.is_empty() || email.is_empty() {
            return None;
        }

        let participant = Participant::new(self.fresh_id(), name, email);
        self.participants.push(participant.clone());
        Some(participant)
    }

    /// Remove a participant by id, returning it if it was present
    pub fn remove(&mut self, id: Uuid) -> Option<Participant> {
        let index = self.participants.iter().position(|p| p.id == id)?;
        Some(self.participants.remove(index))
    }

    /// All participants in insertion order
    pub fn list(&self) -> &[Participant] {
        &self.participants
    }

    pub fn get(&self, id: Uuid) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    fn fresh_id(&self) -> Uuid {
        loop {
            let id = Uuid::new_v4();
            if !self.contains(id) {
                return id;
            }
        }
    }
}

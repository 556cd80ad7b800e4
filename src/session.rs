//! Session state: the registry plus the current assignment set
//!
//! All mutations go through here so the cascading rules live in one place.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use uuid::Uuid;

use crate::engine::{self, EngineError};
use crate::lookup;
use crate::models::{Assignment, Draw, Participant};
use crate::registry::Registry;

/// Outcome of removing a registered participant
#[derive(Debug, Clone, Serialize)]
pub struct Removal {
    pub participant: Participant,
    /// Assignment records dropped because they referenced the participant
    pub invalidated: Vec<Assignment>,
}

#[derive(Debug, Default)]
pub struct Session {
    registry: Registry,
    assignments: Vec<Assignment>,
    drawn_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_participant(&mut self, name: &str, email: &str) -> Option<Participant> {
        self.registry.add(name, email)
    }

    /// Remove a participant and every assignment that mentions them
    pub fn remove_participant(&mut self, id: Uuid) -> Option<Removal> {
        let participant = self.registry.remove(id)?;
        let invalidated = engine::invalidate(&mut self.assignments, id);
        Some(Removal {
            participant,
            invalidated,
        })
    }

    pub fn participants(&self) -> &[Participant] {
        self.registry.list()
    }

    pub fn assign(&mut self) -> Result<Draw, EngineError> {
        self.assign_with_rng(&mut rand::thread_rng())
    }

    /// Replace the assignment set with a fresh draw.
    ///
    /// A refused draw leaves the previous set in place.
    pub fn assign_with_rng<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Draw, EngineError> {
        let assignments = engine::assign_with_rng(self.registry.list(), rng)?;
        self.assignments = assignments;
        self.drawn_at = Some(Utc::now());
        Ok(self.draw())
    }

    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    pub fn draw(&self) -> Draw {
        Draw {
            assignments: self.assignments.clone(),
            drawn_at: self.drawn_at,
        }
    }

    pub fn receiver_for(&self, giver_id: Uuid) -> Option<&Participant> {
        lookup::lookup_receiver(giver_id, &self.assignments, self.registry.list())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn session_with(names: &[&str]) -> (Session, Vec<Participant>) {
        let mut session = Session::new();
        let people = names
            .iter()
            .map(|n| {
                session
                    .add_participant(n, &format!("{}@example.com", n.to_lowercase()))
                    .unwrap()
            })
            .collect();
        (session, people)
    }

    #[test]
    fn test_assign_on_empty_session() {
        let mut session = Session::new();
        let err = session.assign().unwrap_err();

        assert_eq!(err, EngineError::InsufficientParticipants { found: 0 });
        assert!(session.assignments().is_empty());
        assert!(session.draw().drawn_at.is_none());
    }

    #[test]
    fn test_refused_assign_keeps_previous_draw() {
        let (mut session, people) = session_with(&["Alice", "Bob"]);
        let draw = session.assign().unwrap();
        session.remove_participant(people[1].id).unwrap();

        assert!(session.assign().is_err());
        assert_eq!(session.draw().drawn_at, draw.drawn_at);
    }

    #[test]
    fn test_assign_replaces_previous_set() {
        let (mut session, _) = session_with(&["Alice", "Bob", "Carol", "Dave"]);
        session
            .assign_with_rng(&mut ChaCha8Rng::seed_from_u64(1))
            .unwrap();
        session.add_participant("Erin", "erin@example.com").unwrap();
        let draw = session
            .assign_with_rng(&mut ChaCha8Rng::seed_from_u64(2))
            .unwrap();

        assert_eq!(draw.assignments.len(), 5);
        assert_eq!(session.assignments().len(), 5);
    }

    #[test]
    fn test_remove_cascades_to_assignments() {
        let (mut session, people) = session_with(&["Alice", "Bob", "Carol"]);
        session.assign().unwrap();
        let bob = people[1].id;

        let removal = session.remove_participant(bob).unwrap();

        assert_eq!(removal.participant.id, bob);
        assert_eq!(removal.invalidated.len(), 2);
        assert_eq!(session.participants().len(), 2);
        assert_eq!(session.assignments().len(), 1);
        assert!(session.assignments().iter().all(|a| !a.references(bob)));
    }

    #[test]
    fn test_remove_unknown_changes_nothing() {
        let (mut session, _) = session_with(&["Alice", "Bob", "Carol"]);
        session.assign().unwrap();
        let before = session.draw();

        assert!(session.remove_participant(Uuid::new_v4()).is_none());
        assert_eq!(session.participants().len(), 3);
        assert_eq!(session.draw(), before);
    }

    #[test]
    fn test_receiver_for() {
        let (mut session, people) = session_with(&["Alice", "Bob"]);
        assert!(session.receiver_for(people[0].id).is_none());

        session.assign().unwrap();
        assert_eq!(session.receiver_for(people[0].id).unwrap().id, people[1].id);
        assert_eq!(session.receiver_for(people[1].id).unwrap().id, people[0].id);
    }

    #[test]
    fn test_receiver_absent_after_giver_invalidated() {
        let (mut session, people) = session_with(&["Alice", "Bob", "Carol"]);
        session.assign().unwrap();
        session.remove_participant(people[0].id).unwrap();

        // whoever gave to Alice lost their record too
        let orphaned = people[1..]
            .iter()
            .filter(|p| session.receiver_for(p.id).is_none())
            .count();
        assert_eq!(orphaned, 1);
    }
}

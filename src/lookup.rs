//! Recipient lookup

use uuid::Uuid;

use crate::models::{Assignment, Participant};

/// Resolve who `giver_id` buys for.
///
/// Returns `None` when no draw has happened yet, when the giver's record was
/// dropped by a removal, or when the receiver is no longer registered.
pub fn lookup_receiver<'a>(
    giver_id: Uuid,
    assignments: &[Assignment],
    participants: &'a [Participant],
) -> Option<&'a Participant> {
    let assignment = assignments.iter().find(|a| a.giver_id == giver_id)?;
    participants.iter().find(|p| p.id == assignment.receiver_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(name: &str) -> Participant {
        Participant::new(Uuid::new_v4(), name, format!("{}@example.com", name.to_lowercase()))
    }

    #[test]
    fn test_resolves_receiver() {
        let alice = person("Alice");
        let bob = person("Bob");
        let assignments = vec![
            Assignment::new(alice.id, bob.id),
            Assignment::new(bob.id, alice.id),
        ];
        let participants = vec![alice.clone(), bob.clone()];

        let receiver = lookup_receiver(alice.id, &assignments, &participants).unwrap();
        assert_eq!(receiver.id, bob.id);
        assert_eq!(receiver.email, "bob@example.com");
    }

    #[test]
    fn test_absent_without_assignments() {
        let alice = person("Alice");
        let participants = vec![alice.clone()];
        assert!(lookup_receiver(alice.id, &[], &participants).is_none());
    }

    #[test]
    fn test_absent_when_receiver_gone() {
        let alice = person("Alice");
        let bob = person("Bob");
        let assignments = vec![Assignment::new(alice.id, bob.id)];
        let participants = vec![alice.clone()];

        assert!(lookup_receiver(alice.id, &assignments, &participants).is_none());
    }

    #[test]
    fn test_lookup_is_repeatable() {
        let alice = person("Alice");
        let bob = person("Bob");
        let assignments = vec![
            Assignment::new(alice.id, bob.id),
            Assignment::new(bob.id, alice.id),
        ];
        let participants = vec![alice.clone(), bob.clone()];

        let first = lookup_receiver(bob.id, &assignments, &participants).cloned();
        let second = lookup_receiver(bob.id, &assignments, &participants).cloned();
        assert_eq!(first, second);
    }
}

//! Assignment engine
//!
//! Shuffles the participants and links each one to the next, closing the
//! ring at the end. The result is always a single cycle covering everybody,
//! so nobody draws themselves as long as there are at least two people.
//! Other derangements (e.g. two disjoint pairs among four people) are never
//! produced.

use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Assignment, Participant};

/// Smallest group that can exchange gifts
pub const MIN_PARTICIPANTS: usize = 2;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("You need at least 2 participants to assign Secret Santas! (have {found})")]
    InsufficientParticipants { found: usize },
}

/// Draw assignments using the thread-local generator
pub fn assign(participants: &[Participant]) -> Result<Vec<Assignment>, EngineError> {
    assign_with_rng(participants, &mut rand::thread_rng())
}

/// Draw assignments using the supplied generator
pub fn assign_with_rng<R: Rng + ?Sized>(
    participants: &[Participant],
    rng: &mut R,
) -> Result<Vec<Assignment>, EngineError> {
    if participants.len() < MIN_PARTICIPANTS {
        return Err(EngineError::InsufficientParticipants {
            found: participants.len(),
        });
    }

    let mut ring: Vec<Uuid> = participants.iter().map(|p| p.id).collect();
    ring.shuffle(rng);

    Ok(ring
        .iter()
        .zip(ring.iter().cycle().skip(1))
        .map(|(&giver, &receiver)| Assignment::new(giver, receiver))
        .collect())
}

/// Drop every assignment that mentions `id`, returning the dropped records.
///
/// Survivors are left untouched even though the set is no longer a
/// bijection afterwards; the next draw replaces it.
pub fn invalidate(assignments: &mut Vec<Assignment>, id: Uuid) -> Vec<Assignment> {
    let (dropped, kept): (Vec<_>, Vec<_>) = std::mem::take(assignments)
        .into_iter()
        .partition(|a| a.references(id));
    *assignments = kept;
    dropped
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::{HashMap, HashSet};

    fn people(n: usize) -> Vec<Participant> {
        (0..n)
            .map(|i| {
                Participant::new(Uuid::new_v4(), format!("P{}", i), format!("p{}@example.com", i))
            })
            .collect()
    }

    fn follow_cycle(assignments: &[Assignment]) -> usize {
        let next: HashMap<Uuid, Uuid> = assignments
            .iter()
            .map(|a| (a.giver_id, a.receiver_id))
            .collect();
        let start = assignments[0].giver_id;
        let mut current = next[&start];
        let mut steps = 1;
        while current != start {
            current = next[&current];
            steps += 1;
        }
        steps
    }

    #[test]
    fn test_refuses_empty() {
        let err = assign(&[]).unwrap_err();
        assert_eq!(err, EngineError::InsufficientParticipants { found: 0 });
    }

    #[test]
    fn test_refuses_single() {
        let err = assign(&people(1)).unwrap_err();
        assert_eq!(err, EngineError::InsufficientParticipants { found: 1 });
        assert!(err.to_string().contains("at least 2"));
    }

    #[test]
    fn test_two_participants_swap() {
        let group = people(2);
        let assignments = assign(&group).unwrap();
        let pairs: HashSet<(Uuid, Uuid)> = assignments
            .iter()
            .map(|a| (a.giver_id, a.receiver_id))
            .collect();

        let expected: HashSet<(Uuid, Uuid)> =
            [(group[0].id, group[1].id), (group[1].id, group[0].id)]
                .into_iter()
                .collect();
        assert_eq!(pairs, expected);
    }

    #[test]
    fn test_three_participants_single_cycle() {
        let group = people(3);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let assignments = assign_with_rng(&group, &mut rng).unwrap();

        assert_eq!(assignments.len(), 3);
        assert_eq!(follow_cycle(&assignments), 3);
    }

    #[test]
    fn test_same_seed_same_draw() {
        let group = people(8);
        let first = assign_with_rng(&group, &mut ChaCha8Rng::seed_from_u64(42)).unwrap();
        let second = assign_with_rng(&group, &mut ChaCha8Rng::seed_from_u64(42)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_draws_vary_across_runs() {
        let group = people(6);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let draws: HashSet<Vec<Assignment>> = (0..20)
            .map(|_| assign_with_rng(&group, &mut rng).unwrap())
            .collect();
        assert!(draws.len() > 1);
    }

    #[test]
    fn test_invalidate_drops_both_sides() {
        let group = people(4);
        let mut assignments = assign_with_rng(&group, &mut ChaCha8Rng::seed_from_u64(3)).unwrap();
        let target = group[2].id;

        let dropped = invalidate(&mut assignments, target);

        assert_eq!(dropped.len(), 2);
        assert_eq!(assignments.len(), 2);
        assert!(assignments.iter().all(|a| !a.references(target)));
    }

    #[test]
    fn test_invalidate_unknown_id() {
        let group = people(3);
        let mut assignments = assign(&group).unwrap();
        let before = assignments.clone();

        let dropped = invalidate(&mut assignments, Uuid::new_v4());

        assert!(dropped.is_empty());
        assert_eq!(assignments, before);
    }

    proptest! {
        #[test]
        fn prop_assignment_is_single_cycle_derangement(n in 2usize..40, seed in any::<u64>()) {
            let group = people(n);
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let assignments = assign_with_rng(&group, &mut rng).unwrap();

            let ids: HashSet<Uuid> = group.iter().map(|p| p.id).collect();
            let givers: Vec<Uuid> = assignments.iter().map(|a| a.giver_id).collect();
            let receivers: Vec<Uuid> = assignments.iter().map(|a| a.receiver_id).collect();

            prop_assert_eq!(assignments.len(), n);
            prop_assert_eq!(givers.iter().copied().collect::<HashSet<_>>(), ids.clone());
            prop_assert_eq!(receivers.iter().copied().collect::<HashSet<_>>(), ids);
            prop_assert!(assignments.iter().all(|a| a.giver_id != a.receiver_id));
            prop_assert_eq!(follow_cycle(&assignments), n);
        }

        #[test]
        fn prop_fewer_than_two_is_refused(n in 0usize..2) {
            prop_assert!(assign(&people(n)).is_err());
        }
    }
}

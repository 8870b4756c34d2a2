//! Round-robin schedule generation.

use crate::registry::IdGenerator;
use parity_types::{MatchId, MatchRecord, PlayerId, RefereeId, RoundId};
use std::collections::HashSet;

/// Generate the full tournament schedule.
///
/// For each round `1..=rounds`, every unordered player pair (in
/// registration order) becomes one pending match; the identical pairing set
/// repeats across rounds. Referees are assigned by cycling over the referee
/// list in registration order, restarting each round.
///
/// O(rounds x players^2); tournaments are small and this runs once.
pub fn generate_schedule(
    players: &[PlayerId],
    referees: &[RefereeId],
    rounds: u64,
    ids: &mut IdGenerator,
) -> Vec<MatchRecord> {
    let mut schedule = Vec::new();
    let mut used_ids: HashSet<MatchId> = HashSet::new();

    for round in 1..=rounds {
        let round_id = RoundId(round);
        let mut pairing_index = 0usize;

        for (i, player_a) in players.iter().enumerate() {
            for player_b in players.iter().skip(i + 1) {
                let match_id = loop {
                    let candidate = ids.match_id();
                    if used_ids.insert(candidate.clone()) {
                        break candidate;
                    }
                };
                let referee = referees[pairing_index % referees.len()].clone();
                schedule.push(MatchRecord::new(
                    match_id,
                    round_id,
                    player_a.clone(),
                    player_b.clone(),
                    referee,
                ));
                pairing_index += 1;
            }
        }
    }

    schedule
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn players(n: usize) -> Vec<PlayerId> {
        (0..n).map(|i| PlayerId::new(format!("player_{i}"))).collect()
    }

    fn referees(n: usize) -> Vec<RefereeId> {
        (0..n).map(|i| RefereeId::new(format!("ref_{i}"))).collect()
    }

    #[test]
    fn test_match_count_is_rounds_times_pairs() {
        // 4 players: C(4,2) = 6 pairs per round
        let mut ids = IdGenerator::seeded(1);
        let schedule = generate_schedule(&players(4), &referees(2), 3, &mut ids);
        assert_eq!(schedule.len(), 3 * 6);

        for round in 1..=3u64 {
            let in_round = schedule
                .iter()
                .filter(|m| m.round_id == RoundId(round))
                .count();
            assert_eq!(in_round, 6);
        }
    }

    #[test]
    fn test_each_round_covers_every_pair_exactly_once() {
        let mut ids = IdGenerator::seeded(2);
        let player_list = players(5);
        let schedule = generate_schedule(&player_list, &referees(1), 2, &mut ids);

        for round in 1..=2u64 {
            let pairs: BTreeSet<(PlayerId, PlayerId)> = schedule
                .iter()
                .filter(|m| m.round_id == RoundId(round))
                .map(|m| (m.player_a.clone(), m.player_b.clone()))
                .collect();
            // C(5,2) = 10 distinct unordered pairs
            assert_eq!(pairs.len(), 10);
            // Unordered: no pair appears in both orientations
            for (a, b) in &pairs {
                assert!(!pairs.contains(&(b.clone(), a.clone())));
            }
        }
    }

    #[test]
    fn test_referees_cycle_in_registration_order() {
        let mut ids = IdGenerator::seeded(3);
        let schedule = generate_schedule(&players(4), &referees(2), 1, &mut ids);

        let assigned: Vec<&str> = schedule.iter().map(|m| m.referee_id.as_str()).collect();
        assert_eq!(
            assigned,
            vec!["ref_0", "ref_1", "ref_0", "ref_1", "ref_0", "ref_1"]
        );
    }

    #[test]
    fn test_all_matches_start_pending() {
        let mut ids = IdGenerator::seeded(4);
        let schedule = generate_schedule(&players(3), &referees(1), 1, &mut ids);
        assert!(schedule
            .iter()
            .all(|m| m.status == parity_types::MatchStatus::Pending));
    }

    #[test]
    fn test_zero_rounds_is_empty() {
        let mut ids = IdGenerator::seeded(5);
        let schedule = generate_schedule(&players(3), &referees(1), 0, &mut ids);
        assert!(schedule.is_empty());
    }
}

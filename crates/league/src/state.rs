//! The coordinator's owned state aggregate.
//!
//! Synchronous and deterministic: all mutation happens through `&mut self`
//! methods, so the async service layer can serialize ingestion with a
//! single lock and unit tests can drive the whole lifecycle without a
//! runtime.

use crate::error::LeagueError;
use crate::registry::IdGenerator;
use crate::schedule::generate_schedule;
use crate::standings::compute_standings;
use indexmap::IndexMap;
use parity_messages::ScheduleEntry;
use parity_types::{
    AuthToken, Champion, CondensedStanding, MatchId, MatchRecord, MatchResult, MatchStatus,
    Player, PlayerId, PlayerMeta, Referee, RefereeId, RefereeMeta, RoundId, Standing,
};
use tracing::{debug, info};

/// Data for a round-completed notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundCompletion {
    pub round_id: RoundId,
    pub matches_played: u32,
    /// Absent when the completed round was the final one.
    pub next_round_id: Option<RoundId>,
}

/// Data for the one-shot tournament-completed notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeagueCompletion {
    pub total_rounds: u64,
    pub total_matches: u32,
    pub champion: Option<Champion>,
    pub final_standings: Vec<CondensedStanding>,
}

/// Everything one result ingestion produced, for the service layer to
/// broadcast after releasing the state lock.
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub round_id: RoundId,
    pub standings: Vec<Standing>,
    pub round_completed: Option<RoundCompletion>,
    pub league_completed: Option<LeagueCompletion>,
}

/// Registries, schedule and match records for one league lifetime.
///
/// Maps are registration-ordered (`IndexMap`): referee cycling and
/// standings tie-breaks both depend on registration order.
pub struct LeagueState {
    referees: IndexMap<RefereeId, Referee>,
    players: IndexMap<PlayerId, Player>,
    matches: IndexMap<MatchId, MatchRecord>,
    schedule: Vec<MatchId>,
    total_rounds: u64,
    completed: bool,
    ids: IdGenerator,
}

impl LeagueState {
    pub fn new() -> Self {
        Self::with_ids(IdGenerator::from_entropy())
    }

    /// Build with a seeded id generator for reproducible tests.
    pub fn with_ids(ids: IdGenerator) -> Self {
        Self {
            referees: IndexMap::new(),
            players: IndexMap::new(),
            matches: IndexMap::new(),
            schedule: Vec::new(),
            total_rounds: 0,
            completed: false,
            ids,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Registration
    // ═══════════════════════════════════════════════════════════════════════

    /// Register a referee, issuing a fresh id and token.
    pub fn register_referee(&mut self, meta: RefereeMeta) -> (RefereeId, AuthToken) {
        let id = loop {
            let candidate = self.ids.referee_id();
            if !self.referees.contains_key(&candidate) {
                break candidate;
            }
        };
        let token = AuthToken::random();
        info!(referee_id = %id, display_name = %meta.display_name, "Registered referee");
        self.referees
            .insert(id.clone(), Referee::new(id.clone(), token.clone(), meta));
        (id, token)
    }

    /// Register a player, issuing a fresh id and token.
    pub fn register_player(&mut self, meta: PlayerMeta) -> (PlayerId, AuthToken) {
        let id = loop {
            let candidate = self.ids.player_id();
            if !self.players.contains_key(&candidate) {
                break candidate;
            }
        };
        let token = AuthToken::random();
        info!(player_id = %id, display_name = %meta.display_name, "Registered player");
        self.players
            .insert(id.clone(), Player::new(id.clone(), token.clone(), meta));
        (id, token)
    }

    /// Check a referee's identity/token pair.
    pub fn validate_referee(&self, id: &RefereeId, token: &AuthToken) -> bool {
        self.referees
            .get(id)
            .is_some_and(|referee| &referee.auth_token == token)
    }

    /// Check a player's identity/token pair.
    pub fn validate_player(&self, id: &PlayerId, token: &AuthToken) -> bool {
        self.players
            .get(id)
            .is_some_and(|player| &player.auth_token == token)
    }

    pub fn referee(&self, id: &RefereeId) -> Option<&Referee> {
        self.referees.get(id)
    }

    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.get(id)
    }

    /// Registered players in registration order.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    /// Registered referees in registration order.
    pub fn referees(&self) -> impl Iterator<Item = &Referee> {
        self.referees.values()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Scheduling
    // ═══════════════════════════════════════════════════════════════════════

    /// Generate the tournament schedule.
    ///
    /// Fails with `InsufficientParticipants` below 2 players or 1 referee,
    /// and with `ScheduleAlreadyExists` on any second call: the schedule is
    /// generated once and round membership is immutable afterwards.
    pub fn create_schedule(&mut self, rounds: u64) -> Result<(), LeagueError> {
        if !self.schedule.is_empty() {
            return Err(LeagueError::ScheduleAlreadyExists);
        }
        if self.players.len() < 2 || self.referees.is_empty() {
            return Err(LeagueError::InsufficientParticipants {
                players: self.players.len(),
                referees: self.referees.len(),
            });
        }

        let player_ids: Vec<PlayerId> = self.players.keys().cloned().collect();
        let referee_ids: Vec<RefereeId> = self.referees.keys().cloned().collect();

        for record in generate_schedule(&player_ids, &referee_ids, rounds, &mut self.ids) {
            self.schedule.push(record.match_id.clone());
            self.matches.insert(record.match_id.clone(), record);
        }
        self.total_rounds = rounds;
        info!(
            matches = self.schedule.len(),
            rounds, "Created tournament schedule"
        );
        Ok(())
    }

    pub fn total_rounds(&self) -> u64 {
        self.total_rounds
    }

    pub fn match_record(&self, id: &MatchId) -> Option<&MatchRecord> {
        self.matches.get(id)
    }

    /// Matches in schedule order.
    pub fn schedule(&self) -> impl Iterator<Item = &MatchRecord> {
        self.schedule.iter().filter_map(|id| self.matches.get(id))
    }

    /// Mark an assigned match as running.
    pub fn mark_in_progress(&mut self, id: &MatchId) -> Result<(), LeagueError> {
        let record = self
            .matches
            .get_mut(id)
            .ok_or_else(|| LeagueError::MatchNotFound(id.clone()))?;
        if record.status == MatchStatus::Pending {
            record.status = MatchStatus::InProgress;
        }
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Result ingestion
    // ═══════════════════════════════════════════════════════════════════════

    /// Ingest one match result as a single atomic step: terminal status
    /// transition, both players' aggregate mutations, and the two
    /// completion checks.
    ///
    /// A second result for the same match fails with
    /// `MatchAlreadyCompleted` before anything mutates, so aggregates can
    /// never double-count.
    pub fn record_result(
        &mut self,
        match_id: &MatchId,
        result: MatchResult,
    ) -> Result<IngestReport, LeagueError> {
        let record = self
            .matches
            .get(match_id)
            .ok_or_else(|| LeagueError::MatchNotFound(match_id.clone()))?;
        if record.is_completed() {
            return Err(LeagueError::MatchAlreadyCompleted(match_id.clone()));
        }

        let player_a = record.player_a.clone();
        let player_b = record.player_b.clone();
        let round_id = record.round_id;

        // Fatal-only invariant: a scheduled match must reference
        // registered players, and a winner must be one of them.
        if !self.players.contains_key(&player_a) || !self.players.contains_key(&player_b) {
            return Err(LeagueError::InvariantViolation(format!(
                "match {match_id} references unregistered players"
            )));
        }
        if let Some(winner) = &result.winner {
            if winner != &player_a && winner != &player_b {
                return Err(LeagueError::InvariantViolation(format!(
                    "winner {winner} is not a participant of match {match_id}"
                )));
            }
        }

        // Win/loss/draw increments.
        match &result.winner {
            Some(winner) if winner == &player_a => {
                self.players[&player_a].stats.record_win();
                self.players[&player_b].stats.record_loss();
            }
            Some(_) => {
                self.players[&player_b].stats.record_win();
                self.players[&player_a].stats.record_loss();
            }
            None => {
                self.players[&player_a].stats.record_draw();
                self.players[&player_b].stats.record_draw();
            }
        }

        // Point additions as attributed by the result (0 is a no-op add).
        let points_a = result.points_for(&player_a);
        let points_b = result.points_for(&player_b);
        self.players[&player_a].stats.add_points(points_a);
        self.players[&player_b].stats.add_points(points_b);

        // Terminal transition, entered exactly once.
        let record = &mut self.matches[match_id];
        record.status = MatchStatus::Completed;
        record.result = Some(result);
        info!(match_id = %match_id, round_id = %round_id, "Match result recorded");

        let round_completed = self.check_round_completed(round_id);
        let league_completed = self.check_league_completed();

        Ok(IngestReport {
            round_id,
            standings: self.standings(),
            round_completed,
            league_completed,
        })
    }

    /// Escape hatch for matches stuck without a terminal result (join-step
    /// abandonment): completes the match as a scoreless draw so completion
    /// detection cannot wedge. Counts as a draw in both players'
    /// aggregates.
    pub fn void_match(&mut self, match_id: &MatchId) -> Result<IngestReport, LeagueError> {
        let record = self
            .matches
            .get(match_id)
            .ok_or_else(|| LeagueError::MatchNotFound(match_id.clone()))?;
        if record.is_completed() {
            return Err(LeagueError::MatchAlreadyCompleted(match_id.clone()));
        }

        let result = MatchResult {
            winner: None,
            score: [(record.player_a.clone(), 0), (record.player_b.clone(), 0)]
                .into_iter()
                .collect(),
            detail: parity_types::MatchDetail {
                drawn_value: None,
                choices: Default::default(),
                note: Some("voided".to_string()),
            },
        };
        info!(match_id = %match_id, "Voiding stuck match");
        self.record_result(match_id, result)
    }

    fn check_round_completed(&self, round_id: RoundId) -> Option<RoundCompletion> {
        let round_matches: Vec<&MatchRecord> = self
            .matches
            .values()
            .filter(|m| m.round_id == round_id)
            .collect();
        if round_matches.is_empty() || !round_matches.iter().all(|m| m.is_completed()) {
            return None;
        }

        debug!(round_id = %round_id, "Round completed");
        let next_round_id = if round_id.0 < self.total_rounds {
            Some(round_id.next())
        } else {
            None
        };
        Some(RoundCompletion {
            round_id,
            matches_played: round_matches.len() as u32,
            next_round_id,
        })
    }

    /// One-shot: flips the `completed` flag on first detection so the
    /// tournament-completed broadcast can only ever fire once.
    fn check_league_completed(&mut self) -> Option<LeagueCompletion> {
        if self.completed || self.matches.is_empty() {
            return None;
        }
        if !self.matches.values().all(|m| m.is_completed()) {
            return None;
        }
        self.completed = true;
        info!("Tournament completed");

        let standings = self.standings();
        Some(LeagueCompletion {
            total_rounds: self.total_rounds,
            total_matches: self.matches.len() as u32,
            champion: standings.first().map(Champion::from),
            final_standings: standings.iter().map(CondensedStanding::from).collect(),
        })
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Derived views
    // ═══════════════════════════════════════════════════════════════════════

    /// Current standings, recomputed from player aggregates.
    pub fn standings(&self) -> Vec<Standing> {
        compute_standings(self.players.values())
    }

    /// The full schedule as wire rows.
    pub fn schedule_data(&self) -> Vec<ScheduleEntry> {
        self.schedule()
            .map(|m| ScheduleEntry {
                match_id: m.match_id.clone(),
                round_id: m.round_id,
                player_a_id: m.player_a.clone(),
                player_b_id: m.player_b.clone(),
                referee_id: m.referee_id.clone(),
                status: m.status,
            })
            .collect()
    }

    /// First pending match involving the player, in schedule order.
    pub fn next_match(&self, player: &PlayerId) -> Option<ScheduleEntry> {
        self.schedule()
            .find(|m| m.status == MatchStatus::Pending && m.involves(player))
            .map(|m| ScheduleEntry {
                match_id: m.match_id.clone(),
                round_id: m.round_id,
                player_a_id: m.player_a.clone(),
                player_b_id: m.player_b.clone(),
                referee_id: m.referee_id.clone(),
                status: m.status,
            })
    }
}

impl Default for LeagueState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parity_types::Endpoint;
    use std::collections::BTreeMap;
    use tracing_test::traced_test;

    fn player_meta(name: &str) -> PlayerMeta {
        PlayerMeta {
            display_name: name.to_string(),
            endpoint: Endpoint::new(format!("mem://{name}")),
            strategy: None,
        }
    }

    fn referee_meta(name: &str) -> RefereeMeta {
        RefereeMeta {
            display_name: name.to_string(),
            version: None,
            endpoint: Some(Endpoint::new(format!("mem://{name}"))),
        }
    }

    /// N players, one referee, schedule created for `rounds`.
    fn make_league(players: usize, rounds: u64) -> (LeagueState, Vec<PlayerId>) {
        let mut state = LeagueState::with_ids(IdGenerator::seeded(7));
        state.register_referee(referee_meta("referee"));
        let ids: Vec<PlayerId> = (0..players)
            .map(|i| state.register_player(player_meta(&format!("p{i}"))).0)
            .collect();
        state.create_schedule(rounds).unwrap();
        (state, ids)
    }

    fn win_result(winner: &PlayerId, loser: &PlayerId) -> MatchResult {
        MatchResult {
            winner: Some(winner.clone()),
            score: BTreeMap::from([(winner.clone(), 3), (loser.clone(), 0)]),
            detail: Default::default(),
        }
    }

    fn draw_result(a: &PlayerId, b: &PlayerId) -> MatchResult {
        MatchResult {
            winner: None,
            score: BTreeMap::from([(a.clone(), 1), (b.clone(), 1)]),
            detail: Default::default(),
        }
    }

    #[test]
    fn test_registration_issues_unique_credentials() {
        let mut state = LeagueState::with_ids(IdGenerator::seeded(1));
        let (id_a, token_a) = state.register_player(player_meta("a"));
        let (id_b, token_b) = state.register_player(player_meta("b"));
        assert_ne!(id_a, id_b);
        assert_ne!(token_a, token_b);
        assert!(state.validate_player(&id_a, &token_a));
        assert!(!state.validate_player(&id_a, &token_b));
    }

    #[test]
    fn test_schedule_requires_participants() {
        let mut state = LeagueState::with_ids(IdGenerator::seeded(1));
        assert!(matches!(
            state.create_schedule(1),
            Err(LeagueError::InsufficientParticipants { .. })
        ));

        state.register_player(player_meta("a"));
        state.register_player(player_meta("b"));
        // Two players but no referee: still insufficient.
        assert!(matches!(
            state.create_schedule(1),
            Err(LeagueError::InsufficientParticipants { .. })
        ));
    }

    #[test]
    fn test_second_schedule_rejected_and_original_intact() {
        let (mut state, _) = make_league(3, 2);
        let before: Vec<MatchId> = state.schedule().map(|m| m.match_id.clone()).collect();

        assert!(matches!(
            state.create_schedule(5),
            Err(LeagueError::ScheduleAlreadyExists)
        ));
        let after: Vec<MatchId> = state.schedule().map(|m| m.match_id.clone()).collect();
        assert_eq!(before, after);
        assert_eq!(state.total_rounds(), 2);
    }

    #[test]
    fn test_ingestion_mutates_exactly_one_match_and_both_players() {
        let (mut state, players) = make_league(2, 1);
        let match_id = state.schedule().next().unwrap().match_id.clone();

        let report = state
            .record_result(&match_id, win_result(&players[0], &players[1]))
            .unwrap();

        assert_eq!(state.player(&players[0]).unwrap().stats.wins, 1);
        assert_eq!(state.player(&players[0]).unwrap().stats.points_earned, 3);
        assert_eq!(state.player(&players[1]).unwrap().stats.losses, 1);
        assert_eq!(state.player(&players[1]).unwrap().stats.points_earned, 0);
        assert!(state.match_record(&match_id).unwrap().is_completed());
        assert_eq!(report.standings[0].player_id, players[0]);
    }

    #[test]
    fn test_duplicate_ingestion_rejected_without_double_count() {
        let (mut state, players) = make_league(2, 1);
        let match_id = state.schedule().next().unwrap().match_id.clone();

        state
            .record_result(&match_id, win_result(&players[0], &players[1]))
            .unwrap();
        let second = state.record_result(&match_id, win_result(&players[0], &players[1]));
        assert!(matches!(second, Err(LeagueError::MatchAlreadyCompleted(_))));

        // Aggregates unchanged by the rejected second submission.
        assert_eq!(state.player(&players[0]).unwrap().stats.wins, 1);
        assert_eq!(state.player(&players[0]).unwrap().stats.points_earned, 3);
    }

    #[test]
    fn test_unknown_match_rejected() {
        let (mut state, players) = make_league(2, 1);
        let result = state.record_result(
            &MatchId::new("match_bogus"),
            win_result(&players[0], &players[1]),
        );
        assert!(matches!(result, Err(LeagueError::MatchNotFound(_))));
    }

    #[test]
    fn test_foreign_winner_fails_loudly() {
        let (mut state, players) = make_league(2, 1);
        let match_id = state.schedule().next().unwrap().match_id.clone();

        let result = state.record_result(
            &match_id,
            win_result(&PlayerId::new("player_intruder"), &players[1]),
        );
        assert!(matches!(result, Err(LeagueError::InvariantViolation(_))));
        // Nothing mutated.
        assert!(!state.match_record(&match_id).unwrap().is_completed());
        assert_eq!(state.player(&players[0]).unwrap().stats.played(), 0);
    }

    #[test]
    fn test_draw_increments_both() {
        let (mut state, players) = make_league(2, 1);
        let match_id = state.schedule().next().unwrap().match_id.clone();

        state
            .record_result(&match_id, draw_result(&players[0], &players[1]))
            .unwrap();
        assert_eq!(state.player(&players[0]).unwrap().stats.draws, 1);
        assert_eq!(state.player(&players[1]).unwrap().stats.draws, 1);
        assert_eq!(state.player(&players[0]).unwrap().stats.points_earned, 1);
    }

    #[traced_test]
    #[test]
    fn test_round_completion_detected_once_per_round() {
        // 3 players: C(3,2) = 3 matches per round, 2 rounds scheduled.
        let (mut state, players) = make_league(3, 2);
        let round_one: Vec<MatchId> = state
            .schedule()
            .filter(|m| m.round_id == RoundId(1))
            .map(|m| m.match_id.clone())
            .collect();
        assert_eq!(round_one.len(), 3);

        let report = state
            .record_result(&round_one[0], draw_result(&players[0], &players[1]))
            .unwrap();
        assert!(report.round_completed.is_none());

        let report = state
            .record_result(&round_one[1], draw_result(&players[0], &players[2]))
            .unwrap();
        assert!(report.round_completed.is_none());

        let report = state
            .record_result(&round_one[2], draw_result(&players[1], &players[2]))
            .unwrap();
        let completion = report.round_completed.expect("round should complete");
        assert_eq!(completion.round_id, RoundId(1));
        assert_eq!(completion.matches_played, 3);
        assert_eq!(completion.next_round_id, Some(RoundId(2)));
        // Not the whole tournament yet.
        assert!(report.league_completed.is_none());
    }

    #[test]
    fn test_final_round_has_no_next() {
        let (mut state, players) = make_league(2, 1);
        let match_id = state.schedule().next().unwrap().match_id.clone();

        let report = state
            .record_result(&match_id, draw_result(&players[0], &players[1]))
            .unwrap();
        let completion = report.round_completed.expect("round should complete");
        assert_eq!(completion.next_round_id, None);
    }

    #[traced_test]
    #[test]
    fn test_league_completion_fires_exactly_once() {
        let (mut state, players) = make_league(2, 2);
        let all: Vec<MatchId> = state.schedule().map(|m| m.match_id.clone()).collect();
        assert_eq!(all.len(), 2);

        let report = state
            .record_result(&all[0], win_result(&players[0], &players[1]))
            .unwrap();
        assert!(report.league_completed.is_none());

        let report = state
            .record_result(&all[1], win_result(&players[1], &players[0]))
            .unwrap();
        let completion = report.league_completed.expect("league should complete");
        assert_eq!(completion.total_matches, 2);
        assert_eq!(completion.total_rounds, 2);
        assert!(completion.champion.is_some());
        assert_eq!(completion.final_standings.len(), 2);
        assert!(state.is_completed());
    }

    #[test]
    fn test_completion_order_independent() {
        // Finishing the final two matches in the opposite order still
        // produces exactly one league completion.
        let (mut state, players) = make_league(2, 2);
        let all: Vec<MatchId> = state.schedule().map(|m| m.match_id.clone()).collect();

        let report = state
            .record_result(&all[1], win_result(&players[0], &players[1]))
            .unwrap();
        assert!(report.league_completed.is_none());

        let report = state
            .record_result(&all[0], win_result(&players[0], &players[1]))
            .unwrap();
        assert!(report.league_completed.is_some());
    }

    #[test]
    fn test_void_match_unsticks_completion() {
        let (mut state, players) = make_league(2, 1);
        let match_id = state.schedule().next().unwrap().match_id.clone();
        state.mark_in_progress(&match_id).unwrap();

        // The referee abandoned the match: no result ever arrives. Voiding
        // completes it as a scoreless draw and the tournament can finish.
        let report = state.void_match(&match_id).unwrap();
        assert!(report.league_completed.is_some());
        assert_eq!(state.player(&players[0]).unwrap().stats.draws, 1);
        assert_eq!(state.player(&players[0]).unwrap().stats.points_earned, 0);

        let record = state.match_record(&match_id).unwrap();
        assert_eq!(
            record.result.as_ref().unwrap().detail.note.as_deref(),
            Some("voided")
        );

        // Voiding twice is rejected like any duplicate completion.
        assert!(matches!(
            state.void_match(&match_id),
            Err(LeagueError::MatchAlreadyCompleted(_))
        ));
    }

    #[test]
    fn test_next_match_walks_schedule_order() {
        let (mut state, players) = make_league(3, 1);
        let first = state.next_match(&players[0]).expect("has a pending match");

        state
            .record_result(&first.match_id, draw_result(&players[0], &players[1]))
            .unwrap();
        let second = state.next_match(&players[0]).expect("one more pending");
        assert_ne!(first.match_id, second.match_id);
    }
}

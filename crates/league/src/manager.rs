//! The coordinator service: serialized state access plus transport-facing
//! assignment dispatch and broadcasts.

use crate::broadcast::broadcast_to_all;
use crate::error::LeagueError;
use crate::state::{IngestReport, LeagueState};
use parity_core::{AuditSink, MessageClient, Transport};
use parity_messages::{
    Body, LeagueCompleted, LeagueStandingsUpdate, MatchAssignment, Message, RoundAnnouncement,
    RoundCompleted, ScheduleEntry, Sender,
};
use parity_types::{
    AuthToken, Endpoint, LeagueConfig, MatchId, MatchResult, PlayerId, PlayerMeta, RefereeId,
    RefereeMeta, RoundId, Standing,
};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// The league coordinator.
///
/// All state lives behind one async mutex: result ingestion for the same
/// match is trivially serialized, and the stat mutation plus both
/// completion checks happen under a single critical section. Broadcasts
/// run after the lock is released.
pub struct LeagueManager {
    pub(crate) state: Mutex<LeagueState>,
    pub(crate) client: MessageClient,
    pub(crate) audit: Arc<dyn AuditSink>,
    pub(crate) config: LeagueConfig,
}

impl LeagueManager {
    pub fn new(transport: Arc<dyn Transport>, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            state: Mutex::new(LeagueState::new()),
            client: MessageClient::new(transport, Arc::clone(&audit)),
            audit,
            config: LeagueConfig::default(),
        }
    }

    /// Replace the league configuration.
    pub fn with_config(mut self, config: LeagueConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the state aggregate (seeded ids for reproducible tests).
    pub fn with_state(mut self, state: LeagueState) -> Self {
        self.state = Mutex::new(state);
        self
    }

    fn sender(&self) -> Sender {
        Sender::LeagueManager
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Registration
    // ═══════════════════════════════════════════════════════════════════════

    pub async fn register_referee(&self, meta: RefereeMeta) -> (RefereeId, AuthToken) {
        self.state.lock().await.register_referee(meta)
    }

    pub async fn register_player(&self, meta: PlayerMeta) -> (PlayerId, AuthToken) {
        self.state.lock().await.register_player(meta)
    }

    pub async fn validate_player(&self, id: &PlayerId, token: &AuthToken) -> bool {
        self.state.lock().await.validate_player(id, token)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Scheduling & assignment
    // ═══════════════════════════════════════════════════════════════════════

    pub async fn create_schedule(&self, rounds: u64) -> Result<(), LeagueError> {
        self.state.lock().await.create_schedule(rounds)
    }

    /// Create the schedule, dispatch every match to its referee, and
    /// announce the first round. Returns the number of matches whose
    /// referee acknowledged the assignment.
    pub async fn start_league(&self, rounds: u64) -> Result<usize, LeagueError> {
        self.create_schedule(rounds).await?;
        let assigned = self.assign_pending_matches().await;
        self.announce_round(RoundId::FIRST).await;
        info!(assigned, rounds, "League started");
        Ok(assigned)
    }

    /// Send `MATCH_ASSIGNMENT` for every pending match. A failed or
    /// unacknowledged assignment is logged and the match stays pending.
    pub async fn assign_pending_matches(&self) -> usize {
        // Snapshot the dispatch list, then send without holding the lock.
        let assignments: Vec<(MatchAssignment, Endpoint)> = {
            let state = self.state.lock().await;
            state
                .schedule()
                .filter(|m| m.status == parity_types::MatchStatus::Pending)
                .filter_map(|m| {
                    let referee = state.referee(&m.referee_id)?;
                    let Some(referee_endpoint) = referee.meta.endpoint.clone() else {
                        warn!(referee_id = %m.referee_id, "Referee has no endpoint, skipping");
                        return None;
                    };
                    let player_a = state.player(&m.player_a)?;
                    let player_b = state.player(&m.player_b)?;
                    Some((
                        MatchAssignment {
                            match_id: m.match_id.clone(),
                            league_id: self.config.league_id.clone(),
                            round_id: m.round_id,
                            player_a_id: m.player_a.clone(),
                            player_b_id: m.player_b.clone(),
                            player_a_endpoint: player_a.meta.endpoint.clone(),
                            player_b_endpoint: player_b.meta.endpoint.clone(),
                        },
                        referee_endpoint,
                    ))
                })
                .collect()
        };

        let mut assigned = 0;
        for (assignment, referee_endpoint) in assignments {
            let match_id = assignment.match_id.clone();
            let message = Message::new(self.sender(), Body::MatchAssignment(assignment));

            match self.client.call(&referee_endpoint, &message).await {
                Ok(reply) => match reply.body {
                    Body::MatchAssignmentAck(_) => {
                        let mut state = self.state.lock().await;
                        if state.mark_in_progress(&match_id).is_ok() {
                            assigned += 1;
                        }
                    }
                    other => warn!(
                        match_id = %match_id,
                        message_type = other.message_type(),
                        "Unexpected reply to match assignment"
                    ),
                },
                Err(error) => {
                    warn!(match_id = %match_id, error = %error, "Match assignment failed")
                }
            }
        }
        assigned
    }

    /// Broadcast a round announcement with that round's schedule rows.
    pub async fn announce_round(&self, round_id: RoundId) {
        let (schedule, recipients) = {
            let state = self.state.lock().await;
            let schedule: Vec<ScheduleEntry> = state
                .schedule_data()
                .into_iter()
                .filter(|entry| entry.round_id == round_id)
                .collect();
            (schedule, recipients_of(&state))
        };

        let message = Message::new(
            self.sender(),
            Body::RoundAnnouncement(RoundAnnouncement {
                league_id: self.config.league_id.clone(),
                round_id,
                schedule,
            }),
        );
        broadcast_to_all(&self.client, &recipients, &message).await;
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Result ingestion
    // ═══════════════════════════════════════════════════════════════════════

    /// Authenticated result ingestion followed by the broadcast cascade.
    ///
    /// The auth check, stat mutation and completion detection run under the
    /// state lock as one atomic step; a duplicate submission fails before
    /// any aggregate moves.
    pub async fn record_match_result(
        &self,
        reporter: &RefereeId,
        token: &AuthToken,
        match_id: &MatchId,
        result: MatchResult,
    ) -> Result<(), LeagueError> {
        let report = {
            let mut state = self.state.lock().await;
            if !state.validate_referee(reporter, token) {
                return Err(LeagueError::AuthenticationFailed {
                    identity: reporter.to_string(),
                });
            }
            state.record_result(match_id, result)?
        };
        self.broadcast_ingest_report(report).await;
        Ok(())
    }

    /// Operator escape hatch: complete a stuck match as a scoreless draw
    /// (see DESIGN notes on abandonment).
    pub async fn void_match(&self, match_id: &MatchId) -> Result<(), LeagueError> {
        let report = {
            let mut state = self.state.lock().await;
            state.void_match(match_id)?
        };
        self.broadcast_ingest_report(report).await;
        Ok(())
    }

    /// Standings update on every ingest; round/league completion when the
    /// checks fired. League completion can only arrive once: the state
    /// aggregate's one-shot flag guards it.
    async fn broadcast_ingest_report(&self, report: IngestReport) {
        let recipients = {
            let state = self.state.lock().await;
            recipients_of(&state)
        };

        let standings_update = Message::new(
            self.sender(),
            Body::LeagueStandingsUpdate(LeagueStandingsUpdate {
                league_id: self.config.league_id.clone(),
                round_id: report.round_id,
                standings: report.standings,
            }),
        );
        broadcast_to_all(&self.client, &recipients, &standings_update).await;

        if let Some(round) = report.round_completed {
            let message = Message::new(
                self.sender(),
                Body::RoundCompleted(RoundCompleted {
                    league_id: self.config.league_id.clone(),
                    round_id: round.round_id,
                    matches_played: round.matches_played,
                    next_round_id: round.next_round_id,
                }),
            );
            broadcast_to_all(&self.client, &recipients, &message).await;
        }

        if let Some(league) = report.league_completed {
            let message = Message::new(
                self.sender(),
                Body::LeagueCompleted(LeagueCompleted {
                    league_id: self.config.league_id.clone(),
                    total_rounds: league.total_rounds,
                    total_matches: league.total_matches,
                    champion: league.champion,
                    final_standings: league.final_standings,
                }),
            );
            broadcast_to_all(&self.client, &recipients, &message).await;
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Derived views
    // ═══════════════════════════════════════════════════════════════════════

    pub async fn standings(&self) -> Vec<Standing> {
        self.state.lock().await.standings()
    }

    pub async fn schedule_data(&self) -> Vec<ScheduleEntry> {
        self.state.lock().await.schedule_data()
    }

    pub async fn next_match(&self, player: &PlayerId) -> Option<ScheduleEntry> {
        self.state.lock().await.next_match(player)
    }

    /// Stats view for one player, shaped for the `GET_PLAYER_STATS` query.
    pub async fn player_stats(&self, player: &PlayerId) -> Option<serde_json::Value> {
        let state = self.state.lock().await;
        state.player(player).map(|p| {
            json!({
                "player_id": p.id,
                "display_name": p.meta.display_name,
                "wins": p.stats.wins,
                "losses": p.stats.losses,
                "draws": p.stats.draws,
                "total_points_earned": p.stats.points_earned,
                "total_games": p.stats.played(),
            })
        })
    }

    pub async fn is_completed(&self) -> bool {
        self.state.lock().await.is_completed()
    }
}

/// Every registered participant reachable by broadcast: all players plus
/// referees that published an endpoint.
fn recipients_of(state: &LeagueState) -> Vec<(String, Endpoint)> {
    let mut recipients: Vec<(String, Endpoint)> = state
        .players()
        .map(|player| (player.id.to_string(), player.meta.endpoint.clone()))
        .collect();
    recipients.extend(state.referees().filter_map(|referee| {
        referee
            .meta
            .endpoint
            .clone()
            .map(|endpoint| (referee.id.to_string(), endpoint))
    }));
    recipients
}

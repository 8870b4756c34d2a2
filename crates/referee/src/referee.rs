//! The referee service: registration, assignment handling, match execution.

use crate::collector::DecisionCollector;
use crate::outcome::{draw_value, score_for, winning_side, Side};
use crate::session::{GameSession, GameState};
use async_trait::async_trait;
use parity_core::{
    unwrap_payload, wrap_response, AuditDirection, AuditEvent, AuditSink, ClientError, Envelope,
    Handler, MessageClient, Transport,
};
use parity_messages::{
    Ack, Body, ErrorCode, ErrorMessage, GameInvitation, GameOver, GameResult, GameStatus,
    MatchAssignment, MatchAssignmentAck, MatchResultReport, MatchRole, Message,
    RefereeRegisterRequest, RegistrationStatus, Sender,
};
use parity_types::{
    AuthToken, CollectorConfig, Endpoint, LeagueConfig, MatchDetail, MatchId, MatchResult, Parity,
    PlayerId, RefereeId, RefereeMeta,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, RwLock};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Errors surfaced by referee operations.
#[derive(Debug, Error)]
pub enum MatchError {
    /// Registration was refused by the coordinator.
    #[error("registration refused: {0}")]
    RegistrationRefused(String),

    /// A peer replied with something other than the expected message.
    #[error("unexpected reply: {0}")]
    UnexpectedReply(String),

    #[error(transparent)]
    Client(#[from] ClientError),
}

/// How one match execution ended.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchCompletion {
    /// The match ran to a terminal outcome and was reported.
    Reported(MatchResult),

    /// At least one player failed to join; nothing was reported.
    Abandoned { a_joined: bool, b_joined: bool },

    /// An unrecovered fault terminated the match; both players were
    /// notified with an error payload and nothing was reported.
    Faulted(String),
}

struct Identity {
    id: RefereeId,
    token: AuthToken,
}

/// A referee agent.
///
/// Owns no coordinator state: it receives assignments, runs the per-match
/// state machine against the two players, and reports outcomes. A fault in
/// one match never takes the referee down; it keeps accepting assignments.
pub struct Referee {
    client: MessageClient,
    audit: Arc<dyn AuditSink>,
    collector_config: CollectorConfig,
    league_config: LeagueConfig,
    league_endpoint: Endpoint,
    display_name: String,
    contact_endpoint: Endpoint,
    identity: RwLock<Option<Identity>>,
    active: Mutex<HashSet<MatchId>>,
    rng: Mutex<ChaCha8Rng>,
}

impl Referee {
    pub fn new(
        transport: Arc<dyn Transport>,
        audit: Arc<dyn AuditSink>,
        league_endpoint: Endpoint,
        contact_endpoint: Endpoint,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            client: MessageClient::new(transport, Arc::clone(&audit)),
            audit,
            collector_config: CollectorConfig::default(),
            league_config: LeagueConfig::default(),
            league_endpoint,
            display_name: display_name.into(),
            contact_endpoint,
            identity: RwLock::new(None),
            active: Mutex::new(HashSet::new()),
            rng: Mutex::new(ChaCha8Rng::from_entropy()),
        }
    }

    /// Override the decision-collection configuration.
    pub fn with_collector_config(mut self, config: CollectorConfig) -> Self {
        self.collector_config = config;
        self
    }

    /// Seed the draw source for deterministic outcomes.
    pub fn with_draw_seed(self, seed: u64) -> Self {
        *self.rng.lock().expect("rng poisoned") = ChaCha8Rng::seed_from_u64(seed);
        self
    }

    /// The referee id issued at registration, if registered.
    pub fn referee_id(&self) -> Option<RefereeId> {
        self.identity
            .read()
            .expect("identity poisoned")
            .as_ref()
            .map(|identity| identity.id.clone())
    }

    fn sender(&self) -> Sender {
        match self.referee_id() {
            Some(id) => Sender::Referee(id),
            None => Sender::Other("referee:UNREGISTERED".to_string()),
        }
    }

    fn auth_token(&self) -> Option<AuthToken> {
        self.identity
            .read()
            .expect("identity poisoned")
            .as_ref()
            .map(|identity| identity.token.clone())
    }

    /// Register with the league manager, storing the issued credentials.
    pub async fn register(&self) -> Result<RefereeId, MatchError> {
        let request = Message::new(
            self.sender(),
            Body::RefereeRegisterRequest(RefereeRegisterRequest::new(RefereeMeta {
                display_name: self.display_name.clone(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
                endpoint: Some(self.contact_endpoint.clone()),
            })),
        );

        let reply = self.client.call(&self.league_endpoint, &request).await?;
        match reply.body {
            Body::RefereeRegisterResponse(response) => match response.status {
                RegistrationStatus::Accepted => {
                    info!(referee_id = %response.referee_id, "Registered with league");
                    *self.identity.write().expect("identity poisoned") = Some(Identity {
                        id: response.referee_id.clone(),
                        token: response.auth_token,
                    });
                    Ok(response.referee_id)
                }
                RegistrationStatus::Rejected => Err(MatchError::RegistrationRefused(
                    response.reason.unwrap_or_else(|| "rejected".to_string()),
                )),
            },
            other => Err(MatchError::UnexpectedReply(
                other.message_type().to_string(),
            )),
        }
    }

    /// Run one assigned match end-to-end.
    ///
    /// Never panics and never poisons the referee: an unrecovered fault
    /// notifies both players with an error payload and resolves to
    /// [`MatchCompletion::Faulted`].
    pub async fn run_match(&self, assignment: MatchAssignment) -> MatchCompletion {
        let match_id = assignment.match_id.clone();
        {
            let mut active = self.active.lock().expect("active set poisoned");
            if !active.insert(match_id.clone()) {
                warn!(match_id = %match_id, "Match already running, ignoring duplicate assignment");
                return MatchCompletion::Faulted("duplicate assignment".to_string());
            }
        }

        let mut session = GameSession::from_assignment(&assignment);
        info!(match_id = %match_id, round_id = %session.round_id, "Starting match");

        let completion = match self.execute(&mut session).await {
            Ok(completion) => completion,
            Err(fault) => {
                error!(match_id = %match_id, error = %fault, "Match faulted");
                self.notify_fault(&session, &fault.to_string()).await;
                MatchCompletion::Faulted(fault.to_string())
            }
        };

        self.active
            .lock()
            .expect("active set poisoned")
            .remove(&match_id);
        info!(match_id = %match_id, "Match finished, session discarded");
        completion
    }

    /// Drive the state machine. Each state is a fan-out/fan-in barrier;
    /// states never interleave.
    async fn execute(&self, session: &mut GameSession) -> Result<MatchCompletion, MatchError> {
        // ═══ AwaitingParticipants ═════════════════════════════════════════
        let invite_a = self.invitation(session, MatchRole::PlayerA);
        let invite_b = self.invitation(session, MatchRole::PlayerB);
        let (reply_a, reply_b) = tokio::join!(
            self.client.call(&session.seat_a.endpoint, &invite_a),
            self.client.call(&session.seat_b.endpoint, &invite_b),
        );

        session.seat_a.joined = is_join_ack(&reply_a);
        session.seat_b.joined = is_join_ack(&reply_b);

        if !(session.seat_a.joined && session.seat_b.joined) {
            warn!(
                match_id = %session.match_id,
                a_joined = session.seat_a.joined,
                b_joined = session.seat_b.joined,
                "Players failed to join, abandoning match"
            );
            self.notify_abandonment(session).await;
            return Ok(MatchCompletion::Abandoned {
                a_joined: session.seat_a.joined,
                b_joined: session.seat_b.joined,
            });
        }
        debug!(match_id = %session.match_id, "Both players joined");

        // ═══ CollectingDecisions ══════════════════════════════════════════
        session.state = GameState::CollectingDecisions;
        let (outcome_a, outcome_b) = {
            let collector = DecisionCollector {
                client: &self.client,
                config: &self.collector_config,
                sender: self.sender(),
                game_type: self.league_config.game_type.clone(),
                session: &*session,
            };
            tokio::join!(
                collector.collect(
                    &session.seat_a.id,
                    &session.seat_b.id,
                    &session.seat_a.endpoint,
                    session.retries_used(&session.seat_a.id),
                ),
                collector.collect(
                    &session.seat_b.id,
                    &session.seat_a.id,
                    &session.seat_b.endpoint,
                    session.retries_used(&session.seat_b.id),
                ),
            )
        };

        let (a_id, b_id) = (session.seat_a.id.clone(), session.seat_b.id.clone());
        session.set_retries_used(&a_id, outcome_a.attempts_used);
        session.set_retries_used(&b_id, outcome_b.attempts_used);
        session.seat_a.choice = outcome_a.choice;
        session.seat_b.choice = outcome_b.choice;

        // ═══ ResolvingOutcome ═════════════════════════════════════════════
        session.state = GameState::ResolvingOutcome;
        let (winner, note) = match (session.seat_a.choice, session.seat_b.choice) {
            (Some(choice_a), Some(choice_b)) => {
                let drawn = {
                    let mut rng = self.rng.lock().expect("rng poisoned");
                    draw_value(&mut *rng)
                };
                session.drawn_value = Some(drawn);
                debug!(
                    match_id = %session.match_id,
                    drawn,
                    parity = %Parity::of(drawn),
                    choice_a = %choice_a,
                    choice_b = %choice_b,
                    "Resolving outcome"
                );
                let winner = winning_side(drawn, choice_a, choice_b)
                    .map(|side| session_player(session, side));
                (winner, None)
            }
            (Some(_), None) => {
                info!(match_id = %session.match_id, loser = %b_id, "Technical loss");
                (Some(a_id.clone()), Some("technical_loss".to_string()))
            }
            (None, Some(_)) => {
                info!(match_id = %session.match_id, loser = %a_id, "Technical loss");
                (Some(b_id.clone()), Some("technical_loss".to_string()))
            }
            (None, None) => {
                // Neither side responded: explicit double technical loss,
                // completed as a 0/0 draw.
                warn!(match_id = %session.match_id, "Neither player responded");
                (None, Some("double_timeout".to_string()))
            }
        };
        session.winner = winner.clone();

        // ═══ Completed ════════════════════════════════════════════════════
        session.state = GameState::Completed;
        let result = self.build_result(session, note);
        self.notify_game_over(session).await;
        self.report_result(session, &result).await;

        Ok(MatchCompletion::Reported(result))
    }

    fn invitation(&self, session: &GameSession, role: MatchRole) -> Message {
        let opponent = match role {
            MatchRole::PlayerA => &session.seat_b,
            MatchRole::PlayerB => &session.seat_a,
        };
        Message::new(
            self.sender(),
            Body::GameInvitation(GameInvitation {
                league_id: session.league_id.clone(),
                round_id: session.round_id,
                match_id: session.match_id.clone(),
                game_type: self.league_config.game_type.clone(),
                role_in_match: role,
                opponent_id: opponent.id.clone(),
            }),
        )
        .with_conversation(session.conversation_id.clone())
    }

    /// Assemble the terminal result: winner, per-participant scoring
    /// (3/0 decisive, 1/1 draw, 0/0 double technical loss), and detail.
    fn build_result(&self, session: &GameSession, note: Option<String>) -> MatchResult {
        let a_id = session.seat_a.id.clone();
        let b_id = session.seat_b.id.clone();

        let score = if note.as_deref() == Some("double_timeout") {
            BTreeMap::from([(a_id, 0), (b_id, 0)])
        } else {
            let winner_side = session.winner.as_ref().map(|winner| {
                if winner == &session.seat_a.id {
                    Side::A
                } else {
                    Side::B
                }
            });
            let (points_a, points_b) = score_for(winner_side);
            BTreeMap::from([(a_id, points_a), (b_id, points_b)])
        };

        MatchResult {
            winner: session.winner.clone(),
            score,
            detail: MatchDetail {
                drawn_value: session.drawn_value,
                choices: session.choices(),
                note,
            },
        }
    }

    /// Send the identical `GAME_OVER` payload to both players.
    async fn notify_game_over(&self, session: &GameSession) {
        let game_result = GameResult {
            status: if session.winner.is_some() {
                GameStatus::Win
            } else {
                GameStatus::Draw
            },
            winner_player_id: session.winner.clone(),
            drawn_number: session.drawn_value,
            number_parity: session.drawn_value.map(Parity::of),
            choices: session.choices(),
            reason: outcome_reason(session),
        };

        let message = Message::new(
            self.sender(),
            Body::GameOver(GameOver {
                match_id: session.match_id.clone(),
                game_type: self.league_config.game_type.clone(),
                game_result,
            }),
        )
        .with_conversation(session.conversation_id.clone());

        let (sent_a, sent_b) = tokio::join!(
            self.client.notify(&session.seat_a.endpoint, &message),
            self.client.notify(&session.seat_b.endpoint, &message),
        );
        for (seat, sent) in [(&session.seat_a, sent_a), (&session.seat_b, sent_b)] {
            if let Err(error) = sent {
                warn!(player = %seat.id, error = %error, "Game-over delivery failed");
            }
        }
    }

    /// Report the outcome to the coordinator. Delivery failures are logged,
    /// not propagated: the session still completes.
    async fn report_result(&self, session: &GameSession, result: &MatchResult) {
        let Some(token) = self.auth_token() else {
            warn!(match_id = %session.match_id, "Not registered, result not reported");
            return;
        };

        let report = Message::new(
            self.sender(),
            Body::MatchResultReport(MatchResultReport {
                league_id: session.league_id.clone(),
                round_id: session.round_id,
                match_id: session.match_id.clone(),
                game_type: self.league_config.game_type.clone(),
                result: result.clone(),
            }),
        )
        .with_conversation(session.conversation_id.clone())
        .with_auth(token);

        match self.client.call(&self.league_endpoint, &report).await {
            Ok(reply) => match reply.body {
                Body::MatchResultAcknowledged(_) => {
                    debug!(match_id = %session.match_id, "Result acknowledged")
                }
                other => warn!(
                    match_id = %session.match_id,
                    message_type = other.message_type(),
                    "Unexpected reply to result report"
                ),
            },
            Err(error) => {
                warn!(match_id = %session.match_id, error = %error, "Result report failed")
            }
        }
    }

    /// Tell whichever players joined that the match was abandoned.
    async fn notify_abandonment(&self, session: &GameSession) {
        let message = Message::new(
            self.sender(),
            Body::Error(
                ErrorMessage::new(ErrorCode::GameError, "match abandoned: players failed to join")
                    .for_match(session.match_id.clone()),
            ),
        )
        .with_conversation(session.conversation_id.clone());

        for seat in [&session.seat_a, &session.seat_b] {
            if seat.joined {
                if let Err(error) = self.client.notify(&seat.endpoint, &message).await {
                    debug!(player = %seat.id, error = %error, "Abandonment notice failed");
                }
            }
        }
    }

    /// Error payload to both players after an unrecovered fault.
    async fn notify_fault(&self, session: &GameSession, detail: &str) {
        let message = Message::new(
            self.sender(),
            Body::Error(
                ErrorMessage::new(ErrorCode::GameError, detail)
                    .for_match(session.match_id.clone()),
            ),
        )
        .with_conversation(session.conversation_id.clone());

        for seat in [&session.seat_a, &session.seat_b] {
            if let Err(error) = self.client.notify(&seat.endpoint, &message).await {
                debug!(player = %seat.id, error = %error, "Fault notice failed");
            }
        }
    }

    /// Handle one inbound envelope.
    async fn handle_envelope(self: &Arc<Self>, envelope: Envelope) -> Envelope {
        self.audit.record(AuditEvent {
            direction: AuditDirection::Inbound,
            endpoint: None,
            envelope: &envelope,
        });
        let correlation = envelope.echo_correlation();
        let inbound = match Message::from_value(unwrap_payload(&envelope)) {
            Ok(message) => message,
            Err(parse_error) => {
                let reply = Message::new(
                    self.sender(),
                    Body::Error(ErrorMessage::new(
                        ErrorCode::InternalError,
                        format!("unparseable message: {parse_error}"),
                    )),
                );
                let response = respond(reply, correlation);
                self.audit.record(AuditEvent {
                    direction: AuditDirection::Outbound,
                    endpoint: None,
                    envelope: &response,
                });
                return response;
            }
        };

        let reply_body = match inbound.body {
            Body::MatchAssignment(assignment) => {
                let ack = MatchAssignmentAck::accepted(assignment.match_id.clone());
                let referee = Arc::clone(self);
                tokio::spawn(async move {
                    referee.run_match(assignment).await;
                });
                Body::MatchAssignmentAck(ack)
            }
            Body::GameJoinAck(ack) => {
                // Join acks normally arrive as direct responses to the
                // invitation; an unsolicited one is only logged.
                debug!(match_id = %ack.match_id, player = %ack.player_id, "Unsolicited join ack");
                Body::Ack(Ack::received())
            }
            Body::RoundAnnouncement(announcement) => {
                info!(round_id = %announcement.round_id, "Round announced");
                Body::Ack(Ack::received())
            }
            Body::RoundCompleted(completed) => {
                info!(round_id = %completed.round_id, "Round completed");
                Body::Ack(Ack::received())
            }
            Body::LeagueStandingsUpdate(_) => Body::Ack(Ack::received()),
            Body::LeagueCompleted(_) => {
                info!("League completed");
                Body::Ack(Ack::received())
            }
            other => {
                debug!(message_type = other.message_type(), "Acknowledging message");
                Body::Ack(Ack::received())
            }
        };

        let reply = Message::new(self.sender(), reply_body)
            .with_conversation(inbound.conversation_id.clone());
        let response = respond(reply, correlation);
        self.audit.record(AuditEvent {
            direction: AuditDirection::Outbound,
            endpoint: None,
            envelope: &response,
        });
        response
    }
}

/// Newtype wiring an `Arc<Referee>` into the transport's handler seam.
pub struct RefereeHandler(pub Arc<Referee>);

#[async_trait]
impl Handler for RefereeHandler {
    async fn handle(&self, envelope: Envelope) -> Envelope {
        self.0.handle_envelope(envelope).await
    }
}

fn respond(reply: Message, correlation: serde_json::Value) -> Envelope {
    match reply.to_value() {
        Ok(payload) => wrap_response(payload, correlation),
        Err(serialize_error) => wrap_response(
            serde_json::json!({
                "message_type": "ERROR",
                "error_code": "INTERNAL_ERROR",
                "error_message": serialize_error.to_string(),
            }),
            correlation,
        ),
    }
}

fn is_join_ack(reply: &Result<Message, ClientError>) -> bool {
    matches!(
        reply,
        Ok(Message {
            body: Body::GameJoinAck(ack),
            ..
        }) if ack.accept
    )
}

fn session_player(session: &GameSession, side: Side) -> PlayerId {
    match side {
        Side::A => session.seat_a.id.clone(),
        Side::B => session.seat_b.id.clone(),
    }
}

fn outcome_reason(session: &GameSession) -> String {
    match (&session.winner, session.drawn_value) {
        (Some(winner), Some(drawn)) => {
            let choice = if winner == &session.seat_a.id {
                session.seat_a.choice
            } else {
                session.seat_b.choice
            };
            let choice = choice.map(|c| c.to_string()).unwrap_or_default();
            format!(
                "{winner} chose {choice}, number was {drawn} ({})",
                Parity::of(drawn)
            )
        }
        (Some(winner), None) => {
            let loser = if winner == &session.seat_a.id {
                &session.seat_b.id
            } else {
                &session.seat_a.id
            };
            format!("{loser} failed to respond, {winner} wins by default")
        }
        (None, Some(drawn)) => {
            let choice = session
                .seat_a
                .choice
                .map(|c| c.to_string())
                .unwrap_or_default();
            format!(
                "Both players chose {choice}, number was {drawn} ({})",
                Parity::of(drawn)
            )
        }
        (None, None) => "Neither player responded".to_string(),
    }
}

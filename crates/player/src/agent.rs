//! The player agent service.

use crate::strategy::Strategy;
use async_trait::async_trait;
use parity_core::{
    unwrap_payload, wrap_response, AuditDirection, AuditEvent, AuditSink, ClientError, Envelope,
    Handler, MessageClient, Transport,
};
use parity_messages::{
    Ack, Body, ChooseParityResponse, GameJoinAck, GameStatus, LeagueQuery, Message,
    PlayerRegisterRequest, QueryType, RegistrationStatus, ScheduleEntry, Sender,
};
use parity_types::{
    rfc3339_now, AuthToken, Endpoint, MatchId, Parity, PlayerId, PlayerMeta, Standing,
};
use std::sync::{Arc, Mutex, RwLock};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors surfaced by player agent operations.
#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("player is not registered with the league")]
    NotRegistered,

    #[error("registration refused: {0}")]
    RegistrationRefused(String),

    #[error("unexpected reply: {0}")]
    UnexpectedReply(String),

    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Outcome of one game from this player's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    Win,
    Loss,
    Draw,
}

/// One entry of the agent's local game history.
#[derive(Debug, Clone)]
pub struct GameRecord {
    pub match_id: MatchId,
    pub opponent: Option<PlayerId>,
    pub my_choice: Option<Parity>,
    pub opponent_choice: Option<Parity>,
    pub drawn_number: Option<u64>,
    pub outcome: GameOutcome,
    pub timestamp: String,
}

/// Local aggregate counters, independent of coordinator standings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocalStats {
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub total_games: u32,
}

struct Identity {
    id: PlayerId,
    token: AuthToken,
}

#[derive(Debug, Clone)]
struct CurrentMatch {
    opponent_id: PlayerId,
}

/// A player agent.
///
/// Responds to invitations and decision calls, keeps its own history and
/// stats from game-over notifications, and can query the coordinator.
pub struct PlayerAgent {
    client: MessageClient,
    audit: Arc<dyn AuditSink>,
    league_endpoint: Endpoint,
    contact_endpoint: Endpoint,
    display_name: String,
    strategy: Mutex<Box<dyn Strategy>>,
    identity: RwLock<Option<Identity>>,
    last_choice: Mutex<Option<Parity>>,
    history: Mutex<Vec<GameRecord>>,
    current_match: Mutex<Option<CurrentMatch>>,
    upcoming: Mutex<Vec<ScheduleEntry>>,
    stats: Mutex<LocalStats>,
}

impl PlayerAgent {
    pub fn new(
        transport: Arc<dyn Transport>,
        audit: Arc<dyn AuditSink>,
        league_endpoint: Endpoint,
        contact_endpoint: Endpoint,
        display_name: impl Into<String>,
        strategy: Box<dyn Strategy>,
    ) -> Self {
        Self {
            client: MessageClient::new(transport, Arc::clone(&audit)),
            audit,
            league_endpoint,
            contact_endpoint,
            display_name: display_name.into(),
            strategy: Mutex::new(strategy),
            identity: RwLock::new(None),
            last_choice: Mutex::new(None),
            history: Mutex::new(Vec::new()),
            current_match: Mutex::new(None),
            upcoming: Mutex::new(Vec::new()),
            stats: Mutex::new(LocalStats::default()),
        }
    }

    /// The player id issued at registration, if registered.
    pub fn player_id(&self) -> Option<PlayerId> {
        self.identity
            .read()
            .expect("identity poisoned")
            .as_ref()
            .map(|identity| identity.id.clone())
    }

    /// Local stats snapshot.
    pub fn stats(&self) -> LocalStats {
        *self.stats.lock().expect("stats poisoned")
    }

    /// Local game history snapshot.
    pub fn history(&self) -> Vec<GameRecord> {
        self.history.lock().expect("history poisoned").clone()
    }

    /// Schedule rows from the most recent round announcement.
    pub fn upcoming_matches(&self) -> Vec<ScheduleEntry> {
        self.upcoming.lock().expect("upcoming poisoned").clone()
    }

    fn sender(&self) -> Sender {
        match self.player_id() {
            Some(id) => Sender::Player(id),
            None => Sender::Other("player:UNREGISTERED".to_string()),
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
    pub async fn register(&self) -> Result<PlayerId, PlayerError> {
        let strategy_name = self.strategy.lock().expect("strategy poisoned").name();
        let request = Message::new(
            self.sender(),
            Body::PlayerRegisterRequest(PlayerRegisterRequest::new(PlayerMeta {
                display_name: self.display_name.clone(),
                endpoint: self.contact_endpoint.clone(),
                strategy: Some(strategy_name.to_string()),
            })),
        );

        let reply = self.client.call(&self.league_endpoint, &request).await?;
        match reply.body {
            Body::PlayerRegisterResponse(response) => match response.status {
                RegistrationStatus::Accepted => {
                    info!(player_id = %response.player_id, "Registered with league");
                    *self.identity.write().expect("identity poisoned") = Some(Identity {
                        id: response.player_id.clone(),
                        token: response.auth_token,
                    });
                    Ok(response.player_id)
                }
                RegistrationStatus::Rejected => Err(PlayerError::RegistrationRefused(
                    response.reason.unwrap_or_else(|| "rejected".to_string()),
                )),
            },
            other => Err(PlayerError::UnexpectedReply(
                other.message_type().to_string(),
            )),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Queries
    // ═══════════════════════════════════════════════════════════════════════

    async fn query(
        &self,
        query_type: QueryType,
        target: Option<PlayerId>,
    ) -> Result<serde_json::Value, PlayerError> {
        let player_id = self.player_id().ok_or(PlayerError::NotRegistered)?;
        let token = self.auth_token().ok_or(PlayerError::NotRegistered)?;

        let request = Message::new(
            self.sender(),
            Body::LeagueQuery(LeagueQuery {
                query_type,
                player_id,
                target_player_id: target,
            }),
        )
        .with_auth(token);

        let reply = self.client.call(&self.league_endpoint, &request).await?;
        match reply.body {
            Body::LeagueQueryResponse(response) => Ok(response.data),
            other => Err(PlayerError::UnexpectedReply(
                other.message_type().to_string(),
            )),
        }
    }

    /// Current standings from the coordinator.
    pub async fn query_standings(&self) -> Result<Vec<Standing>, PlayerError> {
        let data = self.query(QueryType::GetStandings, None).await?;
        serde_json::from_value(data).map_err(|e| PlayerError::UnexpectedReply(e.to_string()))
    }

    /// This player's next pending match, if any.
    pub async fn query_next_match(&self) -> Result<Option<ScheduleEntry>, PlayerError> {
        let data = self.query(QueryType::GetNextMatch, None).await?;
        if data.is_null() {
            return Ok(None);
        }
        serde_json::from_value(data)
            .map(Some)
            .map_err(|e| PlayerError::UnexpectedReply(e.to_string()))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Inbound handling
    // ═══════════════════════════════════════════════════════════════════════

    fn on_game_over(&self, inbound: &Message) -> Body {
        let Body::GameOver(game_over) = &inbound.body else {
            return Body::Ack(Ack::received());
        };
        let result = &game_over.game_result;
        let my_id = self.player_id();

        let outcome = match (&result.status, &result.winner_player_id) {
            (GameStatus::Draw, _) | (_, None) => GameOutcome::Draw,
            (GameStatus::Win, Some(winner)) if Some(winner) == my_id.as_ref() => GameOutcome::Win,
            (GameStatus::Win, Some(_)) => GameOutcome::Loss,
        };

        {
            let mut stats = self.stats.lock().expect("stats poisoned");
            match outcome {
                GameOutcome::Win => stats.wins += 1,
                GameOutcome::Loss => stats.losses += 1,
                GameOutcome::Draw => stats.draws += 1,
            }
            stats.total_games += 1;
        }

        let current = self
            .current_match
            .lock()
            .expect("current match poisoned")
            .take();
        let opponent = current.as_ref().map(|m| m.opponent_id.clone());
        let opponent_choice = opponent
            .as_ref()
            .and_then(|id| result.choices.get(id).copied())
            .flatten();
        let my_choice = my_id
            .as_ref()
            .and_then(|id| result.choices.get(id).copied())
            .flatten();

        self.history
            .lock()
            .expect("history poisoned")
            .push(GameRecord {
                match_id: game_over.match_id.clone(),
                opponent,
                my_choice,
                opponent_choice,
                drawn_number: result.drawn_number,
                outcome,
                timestamp: rfc3339_now(),
            });

        let stats = self.stats();
        info!(
            match_id = %game_over.match_id,
            outcome = ?outcome,
            wins = stats.wins,
            losses = stats.losses,
            draws = stats.draws,
            "Game over"
        );
        Body::Ack(Ack::received())
    }
}

#[async_trait]
impl Handler for PlayerAgent {
    async fn handle(&self, envelope: Envelope) -> Envelope {
        self.audit.record(AuditEvent {
            direction: AuditDirection::Inbound,
            endpoint: None,
            envelope: &envelope,
        });

        let correlation = envelope.echo_correlation();
        let inbound = match Message::from_value(unwrap_payload(&envelope)) {
            Ok(message) => message,
            Err(parse_error) => {
                debug!(error = %parse_error, "Ignoring unparseable message");
                let ack = Message::new(self.sender(), Body::Ack(Ack::default()));
                let response = match ack.to_value() {
                    Ok(value) => wrap_response(value, correlation),
                    Err(_) => wrap_response(serde_json::Value::Null, serde_json::Value::Null),
                };
                return response;
            }
        };

        let reply_body = match &inbound.body {
            Body::GameInvitation(invitation) => {
                info!(
                    match_id = %invitation.match_id,
                    opponent = %invitation.opponent_id,
                    role = ?invitation.role_in_match,
                    "Invited to match"
                );
                *self.current_match.lock().expect("current match poisoned") =
                    Some(CurrentMatch {
                        opponent_id: invitation.opponent_id.clone(),
                    });
                Body::GameJoinAck(GameJoinAck {
                    match_id: invitation.match_id.clone(),
                    player_id: self.player_id().unwrap_or_else(|| PlayerId::new("UNREGISTERED")),
                    accept: true,
                    arrival_timestamp: rfc3339_now(),
                })
            }

            Body::ChooseParityCall(call) => {
                let choice = {
                    let history = self.history.lock().expect("history poisoned");
                    let last = *self.last_choice.lock().expect("last choice poisoned");
                    let mut strategy = self.strategy.lock().expect("strategy poisoned");
                    strategy.choose(&history, last)
                };
                *self.last_choice.lock().expect("last choice poisoned") = Some(choice);
                debug!(match_id = %call.match_id, choice = %choice, "Declaring parity");
                Body::ChooseParityResponse(ChooseParityResponse {
                    match_id: call.match_id.clone(),
                    choice: choice.as_str().to_string(),
                })
            }

            Body::GameOver(_) => self.on_game_over(&inbound),

            Body::RoundAnnouncement(announcement) => {
                info!(
                    round_id = %announcement.round_id,
                    matches = announcement.schedule.len(),
                    "Round announced"
                );
                *self.upcoming.lock().expect("upcoming poisoned") = announcement.schedule.clone();
                Body::Ack(Ack::received())
            }

            Body::LeagueStandingsUpdate(update) => {
                if let Some(my_id) = self.player_id() {
                    if let Some(mine) = update.standings.iter().find(|s| s.player_id == my_id) {
                        info!(
                            rank = mine.rank,
                            points = mine.points,
                            "Standings updated"
                        );
                    }
                }
                Body::Ack(Ack::received())
            }

            Body::RoundCompleted(completed) => {
                info!(round_id = %completed.round_id, "Round completed");
                Body::Ack(Ack::received())
            }

            Body::LeagueCompleted(completed) => {
                if let Some(my_id) = self.player_id() {
                    if let Some(mine) = completed
                        .final_standings
                        .iter()
                        .find(|s| s.player_id == my_id)
                    {
                        info!(rank = mine.rank, points = mine.points, "Final position");
                    }
                }
                info!("League completed");
                Body::Ack(Ack::received())
            }

            Body::Error(error) => {
                warn!(
                    code = %error.error_code,
                    message = %error.error_message,
                    "Error notice received"
                );
                Body::Ack(Ack::received())
            }

            other => {
                debug!(message_type = other.message_type(), "Acknowledging message");
                Body::Ack(Ack::received())
            }
        };

        let mut reply = Message::new(self.sender(), reply_body)
            .with_conversation(inbound.conversation_id.clone());
        // Join acks and parity responses authenticate the player.
        if matches!(
            reply.body,
            Body::GameJoinAck(_) | Body::ChooseParityResponse(_)
        ) {
            if let Some(token) = self.auth_token() {
                reply = reply.with_auth(token);
            }
        }

        let response = match reply.to_value() {
            Ok(value) => wrap_response(value, correlation),
            Err(serialize_error) => wrap_response(
                serde_json::json!({
                    "message_type": "ERROR",
                    "error_code": "INTERNAL_ERROR",
                    "error_message": serialize_error.to_string(),
                }),
                correlation,
            ),
        };
        self.audit.record(AuditEvent {
            direction: AuditDirection::Outbound,
            endpoint: None,
            envelope: &response,
        });
        response
    }
}

//! The common message header and the tagged body enum.

use crate::broadcast::{
    GameOver, LeagueCompleted, LeagueStandingsUpdate, RoundAnnouncement, RoundCompleted,
};
use crate::request::{
    ChooseParityCall, GameInvitation, LeagueQuery, MatchAssignment, MatchResultReport,
    PlayerRegisterRequest, RefereeRegisterRequest,
};
use crate::response::{
    Ack, ChooseParityResponse, ErrorMessage, GameJoinAck, LeagueQueryResponse, MatchAssignmentAck,
    MatchResultAcknowledged, PlayerRegisterResponse, RefereeRegisterResponse,
};
use parity_types::{rfc3339_now, AuthToken, ConversationId, PlayerId, RefereeId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Protocol version tag carried by every message.
pub const PROTOCOL_VERSION: &str = "league.v2";

/// The originating party of a message, encoded on the wire as
/// `"league_manager"`, `"referee:<id>"` or `"player:<id>"`.
///
/// Unrecognized sender strings are preserved verbatim so parsing a foreign
/// message never fails on this field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Sender {
    LeagueManager,
    Referee(RefereeId),
    Player(PlayerId),
    Other(String),
}

impl Sender {
    /// The referee id, if this sender is a referee.
    pub fn as_referee(&self) -> Option<&RefereeId> {
        match self {
            Sender::Referee(id) => Some(id),
            _ => None,
        }
    }

    /// The player id, if this sender is a player.
    pub fn as_player(&self) -> Option<&PlayerId> {
        match self {
            Sender::Player(id) => Some(id),
            _ => None,
        }
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sender::LeagueManager => f.write_str("league_manager"),
            Sender::Referee(id) => write!(f, "referee:{}", id),
            Sender::Player(id) => write!(f, "player:{}", id),
            Sender::Other(raw) => f.write_str(raw),
        }
    }
}

impl From<String> for Sender {
    fn from(raw: String) -> Self {
        if raw == "league_manager" {
            Sender::LeagueManager
        } else if let Some(id) = raw.strip_prefix("referee:") {
            Sender::Referee(RefereeId::new(id))
        } else if let Some(id) = raw.strip_prefix("player:") {
            Sender::Player(PlayerId::new(id))
        } else {
            Sender::Other(raw)
        }
    }
}

impl From<Sender> for String {
    fn from(sender: Sender) -> Self {
        sender.to_string()
    }
}

/// Message body, tagged by `message_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "message_type")]
pub enum Body {
    // Registration
    #[serde(rename = "REFEREE_REGISTER_REQUEST")]
    RefereeRegisterRequest(RefereeRegisterRequest),
    #[serde(rename = "REFEREE_REGISTER_RESPONSE")]
    RefereeRegisterResponse(RefereeRegisterResponse),
    #[serde(rename = "LEAGUE_REGISTER_REQUEST")]
    PlayerRegisterRequest(PlayerRegisterRequest),
    #[serde(rename = "LEAGUE_REGISTER_RESPONSE")]
    PlayerRegisterResponse(PlayerRegisterResponse),

    // Match assignment
    #[serde(rename = "MATCH_ASSIGNMENT")]
    MatchAssignment(MatchAssignment),
    #[serde(rename = "MATCH_ASSIGNMENT_ACK")]
    MatchAssignmentAck(MatchAssignmentAck),

    // Match flow
    #[serde(rename = "GAME_INVITATION")]
    GameInvitation(GameInvitation),
    #[serde(rename = "GAME_JOIN_ACK")]
    GameJoinAck(GameJoinAck),
    #[serde(rename = "CHOOSE_PARITY_CALL")]
    ChooseParityCall(ChooseParityCall),
    #[serde(rename = "CHOOSE_PARITY_RESPONSE")]
    ChooseParityResponse(ChooseParityResponse),
    #[serde(rename = "GAME_OVER")]
    GameOver(GameOver),
    #[serde(rename = "MATCH_RESULT_REPORT")]
    MatchResultReport(MatchResultReport),
    #[serde(rename = "MATCH_RESULT_ACKNOWLEDGED")]
    MatchResultAcknowledged(MatchResultAcknowledged),

    // League progression
    #[serde(rename = "ROUND_ANNOUNCEMENT")]
    RoundAnnouncement(RoundAnnouncement),
    #[serde(rename = "ROUND_COMPLETED")]
    RoundCompleted(RoundCompleted),
    #[serde(rename = "LEAGUE_STANDINGS_UPDATE")]
    LeagueStandingsUpdate(LeagueStandingsUpdate),
    #[serde(rename = "LEAGUE_COMPLETED")]
    LeagueCompleted(LeagueCompleted),

    // Queries and acknowledgments
    #[serde(rename = "LEAGUE_QUERY")]
    LeagueQuery(LeagueQuery),
    #[serde(rename = "LEAGUE_QUERY_RESPONSE")]
    LeagueQueryResponse(LeagueQueryResponse),
    #[serde(rename = "ACK")]
    Ack(Ack),
    #[serde(rename = "ERROR")]
    Error(ErrorMessage),
}

impl Body {
    /// The wire `message_type` tag for this body.
    pub fn message_type(&self) -> &'static str {
        match self {
            Body::RefereeRegisterRequest(_) => "REFEREE_REGISTER_REQUEST",
            Body::RefereeRegisterResponse(_) => "REFEREE_REGISTER_RESPONSE",
            Body::PlayerRegisterRequest(_) => "LEAGUE_REGISTER_REQUEST",
            Body::PlayerRegisterResponse(_) => "LEAGUE_REGISTER_RESPONSE",
            Body::MatchAssignment(_) => "MATCH_ASSIGNMENT",
            Body::MatchAssignmentAck(_) => "MATCH_ASSIGNMENT_ACK",
            Body::GameInvitation(_) => "GAME_INVITATION",
            Body::GameJoinAck(_) => "GAME_JOIN_ACK",
            Body::ChooseParityCall(_) => "CHOOSE_PARITY_CALL",
            Body::ChooseParityResponse(_) => "CHOOSE_PARITY_RESPONSE",
            Body::GameOver(_) => "GAME_OVER",
            Body::MatchResultReport(_) => "MATCH_RESULT_REPORT",
            Body::MatchResultAcknowledged(_) => "MATCH_RESULT_ACKNOWLEDGED",
            Body::RoundAnnouncement(_) => "ROUND_ANNOUNCEMENT",
            Body::RoundCompleted(_) => "ROUND_COMPLETED",
            Body::LeagueStandingsUpdate(_) => "LEAGUE_STANDINGS_UPDATE",
            Body::LeagueCompleted(_) => "LEAGUE_COMPLETED",
            Body::LeagueQuery(_) => "LEAGUE_QUERY",
            Body::LeagueQueryResponse(_) => "LEAGUE_QUERY_RESPONSE",
            Body::Ack(_) => "ACK",
            Body::Error(_) => "ERROR",
        }
    }
}

/// A complete protocol message: common header plus tagged body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Protocol version tag, always [`PROTOCOL_VERSION`].
    pub protocol: String,

    pub sender: Sender,

    /// RFC 3339 UTC creation timestamp.
    pub timestamp: String,

    pub conversation_id: ConversationId,

    /// Bearer token for privileged calls, absent otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<AuthToken>,

    #[serde(flatten)]
    pub body: Body,
}

impl Message {
    /// Create a message with a fresh conversation id and current timestamp.
    pub fn new(sender: Sender, body: Body) -> Self {
        Self {
            protocol: PROTOCOL_VERSION.to_string(),
            sender,
            timestamp: rfc3339_now(),
            conversation_id: ConversationId::random(),
            auth_token: None,
            body,
        }
    }

    /// Continue an existing conversation instead of starting a fresh one.
    pub fn with_conversation(mut self, conversation_id: ConversationId) -> Self {
        self.conversation_id = conversation_id;
        self
    }

    /// Attach a bearer token.
    pub fn with_auth(mut self, token: AuthToken) -> Self {
        self.auth_token = Some(token);
        self
    }

    /// The wire `message_type` tag.
    pub fn message_type(&self) -> &'static str {
        self.body.message_type()
    }

    /// Serialize into a JSON value (the envelope payload form).
    pub fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Parse a message back out of a JSON value.
    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

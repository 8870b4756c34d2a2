//! Match assignment and in-match request payloads.

use parity_types::{Endpoint, MatchId, MatchResult, PlayerId, RoundId};
use serde::{Deserialize, Serialize};

/// Coordinator → referee: run this match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchAssignment {
    pub match_id: MatchId,
    pub league_id: String,
    pub round_id: RoundId,
    pub player_a_id: PlayerId,
    pub player_b_id: PlayerId,
    pub player_a_endpoint: Endpoint,
    pub player_b_endpoint: Endpoint,
}

/// A participant's seat in the match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchRole {
    #[serde(rename = "PLAYER_A")]
    PlayerA,
    #[serde(rename = "PLAYER_B")]
    PlayerB,
}

/// Referee → player: join this match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameInvitation {
    pub league_id: String,
    pub round_id: RoundId,
    pub match_id: MatchId,
    pub game_type: String,
    pub role_in_match: MatchRole,
    pub opponent_id: PlayerId,
}

/// Game context attached to a decision request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionContext {
    pub opponent_id: PlayerId,
    pub round_id: RoundId,
}

/// Referee → player: declare your parity before the deadline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChooseParityCall {
    pub match_id: MatchId,
    pub player_id: PlayerId,
    pub game_type: String,
    pub context: DecisionContext,
    /// RFC 3339 deadline for this attempt.
    pub deadline: String,
}

/// Referee → coordinator: the match outcome with per-participant scoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResultReport {
    pub league_id: String,
    pub round_id: RoundId,
    pub match_id: MatchId,
    pub game_type: String,
    pub result: MatchResult,
}

//! Match-flow responses.

use serde::{Deserialize, Serialize};

use parity_types::{MatchId, PlayerId};

/// Referee → coordinator: assignment accepted, match will run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchAssignmentAck {
    pub match_id: MatchId,
    pub status: String,
}

impl MatchAssignmentAck {
    pub fn accepted(match_id: MatchId) -> Self {
        Self {
            match_id,
            status: "accepted".to_string(),
        }
    }
}

/// Player → referee: positive (or negative) answer to a game invitation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameJoinAck {
    pub match_id: MatchId,
    pub player_id: PlayerId,
    pub accept: bool,
    /// RFC 3339 timestamp at which the player acknowledged.
    pub arrival_timestamp: String,
}

/// Player → referee: the declared parity.
///
/// `choice` stays a raw string on purpose: an illegal value must reach the
/// decision collector as data, not as a deserialization failure, because it
/// consumes a retry rather than aborting the exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChooseParityResponse {
    pub match_id: MatchId,
    pub choice: String,
}

/// Coordinator → referee: result report ingested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResultAcknowledged {
    pub match_id: MatchId,
}

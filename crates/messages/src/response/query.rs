//! League query response.

use crate::request::QueryType;
use parity_types::{MatchId, MatchStatus, PlayerId, RefereeId, RoundId};
use serde::{Deserialize, Serialize};

/// One schedule row, used by `GET_SCHEDULE` data and round announcements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub match_id: MatchId,
    pub round_id: RoundId,
    pub player_a_id: PlayerId,
    pub player_b_id: PlayerId,
    pub referee_id: RefereeId,
    pub status: MatchStatus,
}

/// Coordinator → player: query answer.
///
/// `data` is shaped by the query subtype (standings list, schedule list,
/// next-match entry or null, player stats).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueQueryResponse {
    pub query_type: QueryType,
    pub data: serde_json::Value,
}

impl LeagueQueryResponse {
    pub fn new(query_type: QueryType, data: serde_json::Value) -> Self {
        Self { query_type, data }
    }
}

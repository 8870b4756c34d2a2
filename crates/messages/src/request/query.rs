//! League query request.

use parity_types::PlayerId;
use serde::{Deserialize, Serialize};

/// Query subtypes a player may ask the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryType {
    #[serde(rename = "GET_STANDINGS")]
    GetStandings,
    #[serde(rename = "GET_SCHEDULE")]
    GetSchedule,
    #[serde(rename = "GET_NEXT_MATCH")]
    GetNextMatch,
    #[serde(rename = "GET_PLAYER_STATS")]
    GetPlayerStats,
}

impl QueryType {
    /// Wire tag for this query subtype.
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::GetStandings => "GET_STANDINGS",
            QueryType::GetSchedule => "GET_SCHEDULE",
            QueryType::GetNextMatch => "GET_NEXT_MATCH",
            QueryType::GetPlayerStats => "GET_PLAYER_STATS",
        }
    }
}

/// Player → coordinator: an authenticated league query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeagueQuery {
    pub query_type: QueryType,
    pub player_id: PlayerId,
    /// Target for `GET_PLAYER_STATS`; defaults to the asking player.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_player_id: Option<PlayerId>,
}

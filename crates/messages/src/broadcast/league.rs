//! League progression broadcasts.

use crate::response::ScheduleEntry;
use parity_types::{Champion, CondensedStanding, RoundId, Standing};
use serde::{Deserialize, Serialize};

/// Coordinator → all: a round is starting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundAnnouncement {
    pub league_id: String,
    pub round_id: RoundId,
    pub schedule: Vec<ScheduleEntry>,
}

/// Coordinator → all: every match of a round has completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundCompleted {
    pub league_id: String,
    pub round_id: RoundId,
    pub matches_played: u32,
    /// Absent when the completed round was the final one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_round_id: Option<RoundId>,
}

/// Coordinator → all: standings after a result ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeagueStandingsUpdate {
    pub league_id: String,
    pub round_id: RoundId,
    pub standings: Vec<Standing>,
}

/// Coordinator → all: the tournament is over. Sent exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeagueCompleted {
    pub league_id: String,
    pub total_rounds: u64,
    pub total_matches: u32,
    /// Top-ranked participant; absent only if no players are registered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub champion: Option<Champion>,
    pub final_standings: Vec<CondensedStanding>,
}

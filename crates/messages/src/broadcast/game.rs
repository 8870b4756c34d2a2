//! Game-over notification sent identically to both participants.

use parity_types::{MatchId, Parity, PlayerId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How the game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    #[serde(rename = "WIN")]
    Win,
    #[serde(rename = "DRAW")]
    Draw,
}

/// Full game outcome attached to a [`GameOver`] notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    pub status: GameStatus,

    /// Winner, absent on a draw.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner_player_id: Option<PlayerId>,

    /// The drawn value, absent for technical outcomes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drawn_number: Option<u64>,

    /// Parity of the drawn value, absent for technical outcomes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_parity: Option<Parity>,

    /// Each participant's declaration; `None` marks a missing decision.
    pub choices: BTreeMap<PlayerId, Option<Parity>>,

    /// Human-readable explanation of the outcome.
    pub reason: String,
}

/// Referee → both players: the match is over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOver {
    pub match_id: MatchId,
    pub game_type: String,
    pub game_result: GameResult,
}

//! Match records owned by the coordinator.

use crate::{MatchId, Parity, PlayerId, RefereeId, RoundId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lifecycle of a scheduled match.
///
/// `Pending → InProgress → Completed`; `Completed` is terminal and entered
/// exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Pending,
    InProgress,
    Completed,
}

/// Auxiliary detail attached to a match result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchDetail {
    /// The drawn value, absent for technical outcomes decided without a draw.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drawn_value: Option<u64>,

    /// Each participant's declaration; `None` marks a missing decision.
    #[serde(default)]
    pub choices: BTreeMap<PlayerId, Option<Parity>>,

    /// Free-form note ("technical_loss", "double_timeout", "voided", ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Terminal outcome of one match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Winner, or `None` for a draw.
    pub winner: Option<PlayerId>,

    /// Points attributed to each participant (3/0 decisive, 1/1 draw,
    /// 0/0 double technical loss or voided match).
    pub score: BTreeMap<PlayerId, u32>,

    /// Auxiliary game detail.
    #[serde(default)]
    pub detail: MatchDetail,
}

impl MatchResult {
    /// Points attributed to one participant, 0 if absent from the score map.
    pub fn points_for(&self, player: &PlayerId) -> u32 {
        self.score.get(player).copied().unwrap_or(0)
    }
}

/// One scheduled contest between two players, supervised by one referee.
///
/// Owned exclusively by the coordinator; referees hold a transient working
/// copy (the game session) during execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub match_id: MatchId,
    pub round_id: RoundId,
    pub player_a: PlayerId,
    pub player_b: PlayerId,
    pub referee_id: RefereeId,
    pub status: MatchStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<MatchResult>,
}

impl MatchRecord {
    /// Create a freshly scheduled match.
    pub fn new(
        match_id: MatchId,
        round_id: RoundId,
        player_a: PlayerId,
        player_b: PlayerId,
        referee_id: RefereeId,
    ) -> Self {
        Self {
            match_id,
            round_id,
            player_a,
            player_b,
            referee_id,
            status: MatchStatus::Pending,
            result: None,
        }
    }

    /// Whether the given player takes part in this match.
    pub fn involves(&self, player: &PlayerId) -> bool {
        &self.player_a == player || &self.player_b == player
    }

    /// The opponent of the given player, if they take part at all.
    pub fn opponent_of(&self, player: &PlayerId) -> Option<&PlayerId> {
        if &self.player_a == player {
            Some(&self.player_b)
        } else if &self.player_b == player {
            Some(&self.player_a)
        } else {
            None
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == MatchStatus::Completed
    }
}

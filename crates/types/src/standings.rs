//! Derived standings entries.

use crate::PlayerId;
use serde::{Deserialize, Serialize};

/// One row of the ranked standings table.
///
/// Recomputed on demand from player aggregates, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    /// 1-based position after sorting by (points, wins, draws) descending.
    pub rank: u32,
    pub player_id: PlayerId,
    pub display_name: String,
    pub played: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub points: u32,
}

/// Condensed standings row used in the tournament-completed broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CondensedStanding {
    pub rank: u32,
    pub player_id: PlayerId,
    pub points: u32,
}

impl From<&Standing> for CondensedStanding {
    fn from(standing: &Standing) -> Self {
        Self {
            rank: standing.rank,
            player_id: standing.player_id.clone(),
            points: standing.points,
        }
    }
}

/// The top-ranked participant announced with tournament completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Champion {
    pub player_id: PlayerId,
    pub display_name: String,
    pub points: u32,
}

impl From<&Standing> for Champion {
    fn from(standing: &Standing) -> Self {
        Self {
            player_id: standing.player_id.clone(),
            display_name: standing.display_name.clone(),
            points: standing.points,
        }
    }
}

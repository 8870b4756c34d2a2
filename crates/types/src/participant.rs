//! Participant records: referees and players.

use crate::{AuthToken, Endpoint, PlayerId, RefereeId};
use serde::{Deserialize, Serialize};

/// Referee metadata supplied at registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefereeMeta {
    /// Human-readable name.
    pub display_name: String,

    /// Reported software version, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Address the referee can be reached at for assignments and broadcasts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<Endpoint>,
}

/// Player metadata supplied at registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerMeta {
    /// Human-readable name.
    pub display_name: String,

    /// Address the player agent can be reached at.
    pub endpoint: Endpoint,

    /// Self-declared strategy label, informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
}

/// A registered referee. Id and token are immutable after registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Referee {
    pub id: RefereeId,
    pub auth_token: AuthToken,
    pub meta: RefereeMeta,
}

impl Referee {
    pub fn new(id: RefereeId, auth_token: AuthToken, meta: RefereeMeta) -> Self {
        Self {
            id,
            auth_token,
            meta,
        }
    }
}

/// Aggregate statistics for one player.
///
/// These are the source of truth standings are derived from; standings are
/// never stored independently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub points_earned: u32,
}

impl PlayerStats {
    /// Total matches played.
    pub fn played(&self) -> u32 {
        self.wins + self.losses + self.draws
    }

    pub fn record_win(&mut self) {
        self.wins += 1;
    }

    pub fn record_loss(&mut self) {
        self.losses += 1;
    }

    pub fn record_draw(&mut self) {
        self.draws += 1;
    }

    pub fn add_points(&mut self, points: u32) {
        self.points_earned += points;
    }
}

/// A registered player. Id and token are immutable after registration;
/// stats mutate as results are ingested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub auth_token: AuthToken,
    pub meta: PlayerMeta,
    #[serde(default)]
    pub stats: PlayerStats,
}

impl Player {
    pub fn new(id: PlayerId, auth_token: AuthToken, meta: PlayerMeta) -> Self {
        Self {
            id,
            auth_token,
            meta,
            stats: PlayerStats::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_played() {
        let mut stats = PlayerStats::default();
        assert_eq!(stats.played(), 0);

        stats.record_win();
        stats.record_loss();
        stats.record_draw();
        stats.record_draw();
        assert_eq!(stats.played(), 4);
        assert_eq!(stats.wins, 1);
        assert_eq!(stats.losses, 1);
        assert_eq!(stats.draws, 2);
    }

    #[test]
    fn test_add_points_zero_is_noop() {
        let mut stats = PlayerStats::default();
        stats.add_points(3);
        stats.add_points(0);
        assert_eq!(stats.points_earned, 3);
    }
}

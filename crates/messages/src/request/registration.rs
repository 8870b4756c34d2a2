//! Registration requests.

use parity_types::{PlayerMeta, RefereeMeta};
use serde::{Deserialize, Serialize};

/// A referee asking to join the league.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefereeRegisterRequest {
    pub referee_meta: RefereeMeta,
}

impl RefereeRegisterRequest {
    pub fn new(referee_meta: RefereeMeta) -> Self {
        Self { referee_meta }
    }
}

/// A player asking to join the league.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRegisterRequest {
    pub player_meta: PlayerMeta,
}

impl PlayerRegisterRequest {
    pub fn new(player_meta: PlayerMeta) -> Self {
        Self { player_meta }
    }
}

//! Registration responses.

use parity_types::{AuthToken, PlayerId, RefereeId};
use serde::{Deserialize, Serialize};

/// Outcome of a registration attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistrationStatus {
    #[serde(rename = "ACCEPTED")]
    Accepted,
    #[serde(rename = "REJECTED")]
    Rejected,
}

/// Coordinator → referee: registration outcome with issued credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefereeRegisterResponse {
    pub status: RegistrationStatus,
    pub referee_id: RefereeId,
    pub auth_token: AuthToken,
    pub league_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Coordinator → player: registration outcome with issued credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRegisterResponse {
    pub status: RegistrationStatus,
    pub player_id: PlayerId,
    pub auth_token: AuthToken,
    pub league_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

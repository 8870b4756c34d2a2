//! Generic acknowledgment and error payloads.

use parity_types::MatchId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Generic acknowledgment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl Ack {
    /// Plain "received" acknowledgment.
    pub fn received() -> Self {
        Self {
            status: Some("received".to_string()),
        }
    }
}

/// Structured wire error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    #[serde(rename = "AUTH_FAILED")]
    AuthFailed,
    #[serde(rename = "MATCH_NOT_FOUND")]
    MatchNotFound,
    #[serde(rename = "INSUFFICIENT_PARTICIPANTS")]
    InsufficientParticipants,
    #[serde(rename = "SCHEDULE_EXISTS")]
    ScheduleExists,
    #[serde(rename = "MATCH_ALREADY_COMPLETED")]
    MatchAlreadyCompleted,
    #[serde(rename = "UNKNOWN_MESSAGE_TYPE")]
    UnknownMessageType,
    #[serde(rename = "UNKNOWN_QUERY")]
    UnknownQuery,
    #[serde(rename = "TIMEOUT")]
    Timeout,
    #[serde(rename = "GAME_ERROR")]
    GameError,
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError,
}

impl ErrorCode {
    /// Wire tag for this error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::AuthFailed => "AUTH_FAILED",
            ErrorCode::MatchNotFound => "MATCH_NOT_FOUND",
            ErrorCode::InsufficientParticipants => "INSUFFICIENT_PARTICIPANTS",
            ErrorCode::ScheduleExists => "SCHEDULE_EXISTS",
            ErrorCode::MatchAlreadyCompleted => "MATCH_ALREADY_COMPLETED",
            ErrorCode::UnknownMessageType => "UNKNOWN_MESSAGE_TYPE",
            ErrorCode::UnknownQuery => "UNKNOWN_QUERY",
            ErrorCode::Timeout => "TIMEOUT",
            ErrorCode::GameError => "GAME_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured error payload: code plus human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub error_code: ErrorCode,
    pub error_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_id: Option<MatchId>,
}

impl ErrorMessage {
    pub fn new(error_code: ErrorCode, error_message: impl Into<String>) -> Self {
        Self {
            error_code,
            error_message: error_message.into(),
            match_id: None,
        }
    }

    /// Scope the error to a specific match.
    pub fn for_match(mut self, match_id: MatchId) -> Self {
        self.match_id = Some(match_id);
        self
    }
}

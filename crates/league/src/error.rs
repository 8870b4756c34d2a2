//! Coordinator error taxonomy.

use parity_messages::ErrorCode;
use parity_types::MatchId;
use thiserror::Error;

/// Errors surfaced by coordinator operations.
#[derive(Debug, Error)]
pub enum LeagueError {
    /// Identity/token pair did not match the registration record for that
    /// role.
    #[error("authentication failed for {identity}")]
    AuthenticationFailed { identity: String },

    #[error("match {0} not found")]
    MatchNotFound(MatchId),

    /// Scheduling requires at least 2 players and 1 referee.
    #[error("insufficient participants: {players} players, {referees} referees")]
    InsufficientParticipants { players: usize, referees: usize },

    /// The schedule is generated once per tournament; a second call is
    /// rejected rather than silently regenerating.
    #[error("schedule already exists")]
    ScheduleAlreadyExists,

    /// A result for this match was already ingested; aggregates are never
    /// applied twice.
    #[error("match {0} already completed")]
    MatchAlreadyCompleted(MatchId),

    #[error("unknown message type: {0}")]
    UnknownMessageType(String),

    #[error("unknown query type: {0}")]
    UnknownQueryType(String),

    /// Internal consistency is broken (e.g. a match referencing an
    /// unregistered player). Fails loudly instead of mutating
    /// inconsistent state.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

impl LeagueError {
    /// The wire error code this error maps to.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            LeagueError::AuthenticationFailed { .. } => ErrorCode::AuthFailed,
            LeagueError::MatchNotFound(_) => ErrorCode::MatchNotFound,
            LeagueError::InsufficientParticipants { .. } => ErrorCode::InsufficientParticipants,
            LeagueError::ScheduleAlreadyExists => ErrorCode::ScheduleExists,
            LeagueError::MatchAlreadyCompleted(_) => ErrorCode::MatchAlreadyCompleted,
            LeagueError::UnknownMessageType(_) => ErrorCode::UnknownMessageType,
            LeagueError::UnknownQueryType(_) => ErrorCode::UnknownQuery,
            LeagueError::InvariantViolation(_) => ErrorCode::InternalError,
        }
    }
}

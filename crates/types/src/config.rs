//! Configuration for match execution and league identity.

use std::time::Duration;

/// Configuration for decision collection.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Retry budget per participant per match. Timeouts, transport failures,
    /// malformed responses, and illegal values all consume one attempt.
    pub max_retries: u32,

    /// Timeout for a single decision attempt.
    pub attempt_timeout: Duration,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            attempt_timeout: Duration::from_secs(30),
        }
    }
}

impl CollectorConfig {
    /// Create a config with a custom retry budget.
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// Create a config with a custom per-attempt timeout.
    pub fn with_attempt_timeout(attempt_timeout: Duration) -> Self {
        Self {
            attempt_timeout,
            ..Default::default()
        }
    }
}

/// League identity shared across all messages.
#[derive(Debug, Clone)]
pub struct LeagueConfig {
    /// League identifier carried in every league-scoped message.
    pub league_id: String,

    /// Game type identifier for invitations and decision calls.
    pub game_type: String,
}

impl Default for LeagueConfig {
    fn default() -> Self {
        Self {
            league_id: "league_2025_even_odd".to_string(),
            game_type: "even_odd".to_string(),
        }
    }
}

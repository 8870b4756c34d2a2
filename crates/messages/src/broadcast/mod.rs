//! Fan-out payloads delivered best-effort to many recipients.
//!
//! Unlike the correlated request/response pairs, these carry no expectation
//! of a meaningful reply; a failed delivery to one recipient never blocks
//! the others.

mod game;
mod league;

pub use game::{GameOver, GameResult, GameStatus};
pub use league::{LeagueCompleted, LeagueStandingsUpdate, RoundAnnouncement, RoundCompleted};

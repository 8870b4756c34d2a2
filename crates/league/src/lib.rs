//! League coordinator.
//!
//! Owns the only cross-match shared state: participant registries, the
//! schedule, and match records. Result ingestion is serialized behind one
//! lock so two concurrent completions of the same match can never
//! double-count, and the tournament-completed broadcast fires exactly once
//! per league lifetime.

mod broadcast;
mod error;
mod handler;
mod manager;
mod registry;
mod schedule;
mod standings;
mod state;

pub use error::LeagueError;
pub use handler::LeagueHandler;
pub use manager::LeagueManager;
pub use registry::IdGenerator;
pub use schedule::generate_schedule;
pub use standings::compute_standings;
pub use state::{IngestReport, LeagueCompletion, LeagueState, RoundCompletion};

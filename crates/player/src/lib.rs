//! Player agent: joins matches, declares parities via a pluggable
//! strategy, and tracks its own results.

mod agent;
mod strategy;

pub use agent::{GameOutcome, GameRecord, LocalStats, PlayerAgent, PlayerError};
pub use strategy::{Alternating, HistoryBased, Random, Strategy};

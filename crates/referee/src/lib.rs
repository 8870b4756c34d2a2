//! Referee agent: runs one match end-to-end against two remote players.
//!
//! The state machine is a sequence of fan-out/fan-in barriers
//! (`AwaitingParticipants → CollectingDecisions → ResolvingOutcome →
//! Completed`) with no back-transitions; the only suspension points are the
//! two concurrent invitation acknowledgments and the two concurrent
//! decision collections.

mod collector;
mod outcome;
mod referee;
mod session;

pub use collector::{CollectOutcome, DecisionCollector};
pub use outcome::{draw_value, score_for, winning_side, Side, DRAW_POINTS, WIN_POINTS};
pub use referee::{MatchCompletion, MatchError, Referee, RefereeHandler};
pub use session::{GameSession, GameState, Seat};

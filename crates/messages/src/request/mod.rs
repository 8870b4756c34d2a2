//! Correlated request payloads: the sender expects a typed response.

mod match_flow;
mod query;
mod registration;

pub use match_flow::{
    ChooseParityCall, DecisionContext, GameInvitation, MatchAssignment, MatchRole,
    MatchResultReport,
};
pub use query::{LeagueQuery, QueryType};
pub use registration::{PlayerRegisterRequest, RefereeRegisterRequest};

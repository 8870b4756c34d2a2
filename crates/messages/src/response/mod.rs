//! Response payloads echoing a request's conversation.

mod match_flow;
mod query;
mod registration;
mod status;

pub use match_flow::{ChooseParityResponse, GameJoinAck, MatchAssignmentAck, MatchResultAcknowledged};
pub use query::{LeagueQueryResponse, ScheduleEntry};
pub use registration::{PlayerRegisterResponse, RefereeRegisterResponse, RegistrationStatus};
pub use status::{Ack, ErrorCode, ErrorMessage};

//! Protocol messages for the parity league.
//!
//! Every message is a flat JSON object sharing the common header fields
//! (`protocol`, `message_type`, `sender`, `timestamp`, `conversation_id`,
//! optionally `auth_token`); the `message_type` tag selects the body shape.

mod message;

pub mod broadcast;
pub mod request;
pub mod response;

// Re-export commonly used types
pub use broadcast::{
    GameOver, GameResult, GameStatus, LeagueCompleted, LeagueStandingsUpdate, RoundAnnouncement,
    RoundCompleted,
};
pub use message::{Body, Message, Sender, PROTOCOL_VERSION};
pub use request::{
    ChooseParityCall, DecisionContext, GameInvitation, LeagueQuery, MatchAssignment, MatchRole,
    MatchResultReport, PlayerRegisterRequest, QueryType, RefereeRegisterRequest,
};
pub use response::{
    Ack, ChooseParityResponse, ErrorCode, ErrorMessage, GameJoinAck, LeagueQueryResponse,
    MatchAssignmentAck, MatchResultAcknowledged, PlayerRegisterResponse, RefereeRegisterResponse,
    RegistrationStatus, ScheduleEntry,
};

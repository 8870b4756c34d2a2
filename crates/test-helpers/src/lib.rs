//! Test support: an in-memory transport that routes envelopes between
//! in-process handlers, scripted participants, and a recording audit sink.

mod network;
mod participants;

pub use network::{InMemoryNetwork, RecordingSink};
pub use participants::{BroadcastRecorder, ChoiceReply, ScriptedPlayer};

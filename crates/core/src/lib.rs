//! Envelope codec, correlation tracking, and the transport seams every
//! agent role builds on.

mod client;
mod correlation;
mod envelope;
mod traits;

pub use client::{ClientError, MessageClient};
pub use correlation::CorrelationCounter;
pub use envelope::{
    is_envelope, method_for, unwrap_payload, wrap_error, wrap_request, wrap_response, Envelope,
    UNKNOWN_METHOD,
};
pub use traits::{
    AuditDirection, AuditEvent, AuditSink, Handler, NoopAuditSink, Transport, TransportError,
};

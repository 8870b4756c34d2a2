//! Seams to the outside world: transport, inbound handling, audit.

use crate::Envelope;
use async_trait::async_trait;
use parity_types::Endpoint;
use thiserror::Error;

/// Errors crossing the transport boundary.
#[derive(Debug, Error)]
pub enum TransportError {
    /// No route to the endpoint.
    #[error("endpoint unreachable: {0}")]
    Unreachable(String),

    /// The send itself failed mid-flight.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// No response arrived in time.
    #[error("timed out awaiting response")]
    Timeout,
}

/// Outbound request/response capability.
///
/// The concrete transport (HTTP or otherwise) is an external collaborator;
/// the core only ever sends an envelope and awaits the peer's response
/// envelope.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, endpoint: &Endpoint, envelope: Envelope) -> Result<Envelope, TransportError>;
}

/// Inbound entry point of one agent role.
///
/// A handler must always produce a response envelope; it never leaves a
/// request hanging, surfacing failures as structured error payloads instead.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, envelope: Envelope) -> Envelope;
}

/// Direction of an audited envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditDirection {
    Inbound,
    Outbound,
}

/// One audited envelope crossing the boundary.
#[derive(Debug, Clone, Copy)]
pub struct AuditEvent<'a> {
    pub direction: AuditDirection,
    /// Remote endpoint for outbound sends; inbound envelopes carry none.
    pub endpoint: Option<&'a Endpoint>,
    pub envelope: &'a Envelope,
}

/// Hook point invoked before each send and after each receive.
///
/// The append-only audit trail itself is an external collaborator; the core
/// only guarantees the hook fires.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent<'_>);
}

/// Sink that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _event: AuditEvent<'_>) {}
}

//! Typed request/response client over the transport seam.

use crate::{
    unwrap_payload, wrap_request, AuditDirection, AuditEvent, AuditSink, CorrelationCounter,
    Transport, TransportError,
};
use parity_messages::Message;
use parity_types::Endpoint;
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by [`MessageClient`] calls.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The peer responded, but not with a parseable protocol message.
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Sends typed messages and returns typed replies.
///
/// Wraps each message in a request envelope under a fresh correlation id,
/// fires the audit hook on both directions, and parses the response payload
/// back into a [`Message`].
pub struct MessageClient {
    transport: Arc<dyn Transport>,
    audit: Arc<dyn AuditSink>,
    correlation: CorrelationCounter,
}

impl MessageClient {
    pub fn new(transport: Arc<dyn Transport>, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            transport,
            audit,
            correlation: CorrelationCounter::new(),
        }
    }

    /// Send a message and parse the typed reply.
    pub async fn call(&self, endpoint: &Endpoint, message: &Message) -> Result<Message, ClientError> {
        let payload = message
            .to_value()
            .map_err(|e| ClientError::Malformed(e.to_string()))?;
        let envelope = wrap_request(payload, self.correlation.next());

        self.audit.record(AuditEvent {
            direction: AuditDirection::Outbound,
            endpoint: Some(endpoint),
            envelope: &envelope,
        });

        let response = self.transport.send(endpoint, envelope).await?;

        self.audit.record(AuditEvent {
            direction: AuditDirection::Inbound,
            endpoint: Some(endpoint),
            envelope: &response,
        });

        Message::from_value(unwrap_payload(&response))
            .map_err(|e| ClientError::Malformed(e.to_string()))
    }

    /// Send a message where only delivery matters, discarding the reply
    /// payload. Still awaits the peer's response envelope so transport
    /// failures surface.
    pub async fn notify(&self, endpoint: &Endpoint, message: &Message) -> Result<(), ClientError> {
        let payload = message
            .to_value()
            .map_err(|e| ClientError::Malformed(e.to_string()))?;
        let envelope = wrap_request(payload, self.correlation.next());

        self.audit.record(AuditEvent {
            direction: AuditDirection::Outbound,
            endpoint: Some(endpoint),
            envelope: &envelope,
        });

        let response = self.transport.send(endpoint, envelope).await?;

        self.audit.record(AuditEvent {
            direction: AuditDirection::Inbound,
            endpoint: Some(endpoint),
            envelope: &response,
        });

        Ok(())
    }
}

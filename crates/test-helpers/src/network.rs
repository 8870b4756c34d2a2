//! In-memory envelope routing in place of a real transport.

use async_trait::async_trait;
use parity_core::{
    AuditDirection, AuditEvent, AuditSink, Envelope, Handler, Transport, TransportError,
};
use parity_types::Endpoint;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

/// Routes envelopes directly to registered handlers by endpoint.
///
/// Sends to unregistered endpoints fail with
/// [`TransportError::Unreachable`], which is how tests simulate a dead
/// participant without any real I/O.
#[derive(Default)]
pub struct InMemoryNetwork {
    routes: RwLock<HashMap<Endpoint, Arc<dyn Handler>>>,
}

impl InMemoryNetwork {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register (or replace) the handler reachable at an endpoint.
    pub fn register(&self, endpoint: Endpoint, handler: Arc<dyn Handler>) {
        self.routes
            .write()
            .expect("route table poisoned")
            .insert(endpoint, handler);
    }

    /// Drop an endpoint's route, making it unreachable from then on.
    pub fn disconnect(&self, endpoint: &Endpoint) {
        self.routes
            .write()
            .expect("route table poisoned")
            .remove(endpoint);
    }
}

#[async_trait]
impl Transport for InMemoryNetwork {
    async fn send(&self, endpoint: &Endpoint, envelope: Envelope) -> Result<Envelope, TransportError> {
        let handler = {
            let routes = self.routes.read().expect("route table poisoned");
            routes.get(endpoint).cloned()
        };
        match handler {
            Some(handler) => Ok(handler.handle(envelope).await),
            None => Err(TransportError::Unreachable(endpoint.to_string())),
        }
    }
}

/// Audit sink that captures every event for later assertions.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<(AuditDirection, Envelope)>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.events.lock().expect("sink poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all recorded events.
    pub fn snapshot(&self) -> Vec<(AuditDirection, Envelope)> {
        self.events.lock().expect("sink poisoned").clone()
    }
}

impl AuditSink for RecordingSink {
    fn record(&self, event: AuditEvent<'_>) {
        self.events
            .lock()
            .expect("sink poisoned")
            .push((event.direction, event.envelope.clone()));
    }
}

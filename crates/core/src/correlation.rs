//! Correlation id allocation for outbound requests.

use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};

/// Allocates monotonically increasing correlation ids for one agent.
///
/// Ids only need to be unique per sender; the codec treats them as opaque
/// and preserves whatever shape the peer echoes back.
#[derive(Debug)]
pub struct CorrelationCounter {
    next: AtomicU64,
}

impl CorrelationCounter {
    /// Create a counter starting at 1.
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Allocate the next correlation id.
    pub fn next(&self) -> Value {
        Value::from(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for CorrelationCounter {
    fn default() -> Self {
        Self::new()
    }
}

//! Best-effort fan-out to registered participants.

use futures::future::join_all;
use parity_core::MessageClient;
use parity_messages::Message;
use parity_types::Endpoint;
use tracing::{debug, warn};

/// Deliver one message to every recipient concurrently.
///
/// Failures are logged per recipient and never block the others nor affect
/// coordinator state. Returns the number of successful deliveries.
pub(crate) async fn broadcast_to_all(
    client: &MessageClient,
    recipients: &[(String, Endpoint)],
    message: &Message,
) -> usize {
    let sends = recipients.iter().map(|(label, endpoint)| async move {
        match client.notify(endpoint, message).await {
            Ok(()) => {
                debug!(
                    recipient = %label,
                    message_type = message.message_type(),
                    "Broadcast delivered"
                );
                true
            }
            Err(error) => {
                warn!(
                    recipient = %label,
                    message_type = message.message_type(),
                    error = %error,
                    "Broadcast delivery failed"
                );
                false
            }
        }
    });

    join_all(sends).await.into_iter().filter(|ok| *ok).count()
}

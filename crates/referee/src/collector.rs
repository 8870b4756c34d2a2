//! Decision collection: obtain one participant's declaration under a
//! bounded retry budget and per-attempt timeout.
//!
//! Transport failures, malformed responses, illegal values and timeouts all
//! consume one attempt and never propagate past the collector; a timeout
//! additionally sends an out-of-band notice to the participant.

use crate::session::GameSession;
use parity_messages::{
    Body, ChooseParityCall, DecisionContext, ErrorCode, ErrorMessage, Message, Sender,
};
use parity_types::{deadline_after, CollectorConfig, Endpoint, Parity, PlayerId};
use parity_core::MessageClient;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Result of one collection run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectOutcome {
    /// The accepted declaration, or `None` once the budget is exhausted.
    pub choice: Option<Parity>,
    /// Cumulative attempts consumed by this participant within the match.
    pub attempts_used: u32,
}

/// Collects one participant's decision on behalf of a match.
pub struct DecisionCollector<'a> {
    pub client: &'a MessageClient,
    pub config: &'a CollectorConfig,
    pub sender: Sender,
    pub game_type: String,
    pub session: &'a GameSession,
}

impl<'a> DecisionCollector<'a> {
    /// Request `player`'s declaration, starting from `attempts_used`
    /// previously consumed attempts.
    ///
    /// The returned count is cumulative: callers store it back into the
    /// session so a later invocation for the same participant starts where
    /// this one left off.
    pub async fn collect(
        &self,
        player: &PlayerId,
        opponent: &PlayerId,
        endpoint: &Endpoint,
        attempts_used: u32,
    ) -> CollectOutcome {
        let mut used = attempts_used;

        while used < self.config.max_retries {
            let call = Message::new(
                self.sender.clone(),
                Body::ChooseParityCall(ChooseParityCall {
                    match_id: self.session.match_id.clone(),
                    player_id: player.clone(),
                    game_type: self.game_type.clone(),
                    context: DecisionContext {
                        opponent_id: opponent.clone(),
                        round_id: self.session.round_id,
                    },
                    deadline: deadline_after(self.config.attempt_timeout),
                }),
            )
            .with_conversation(self.session.conversation_id.clone());

            match timeout(self.config.attempt_timeout, self.client.call(endpoint, &call)).await {
                Err(_elapsed) => {
                    used += 1;
                    warn!(
                        match_id = %self.session.match_id,
                        player = %player,
                        attempt = used,
                        "Decision attempt timed out"
                    );
                    self.send_timeout_notice(player, endpoint).await;
                }
                Ok(Err(error)) => {
                    // Transport failure or malformed response: absorbed
                    // into the budget, never propagated.
                    used += 1;
                    warn!(
                        match_id = %self.session.match_id,
                        player = %player,
                        attempt = used,
                        error = %error,
                        "Decision attempt failed"
                    );
                }
                Ok(Ok(reply)) => match reply.body {
                    Body::ChooseParityResponse(response) => {
                        match response.choice.parse::<Parity>() {
                            Ok(choice) => {
                                debug!(
                                    match_id = %self.session.match_id,
                                    player = %player,
                                    choice = %choice,
                                    "Decision accepted"
                                );
                                return CollectOutcome {
                                    choice: Some(choice),
                                    attempts_used: used,
                                };
                            }
                            Err(_) => {
                                used += 1;
                                warn!(
                                    match_id = %self.session.match_id,
                                    player = %player,
                                    choice = %response.choice,
                                    attempt = used,
                                    "Illegal choice value"
                                );
                            }
                        }
                    }
                    other => {
                        used += 1;
                        warn!(
                            match_id = %self.session.match_id,
                            player = %player,
                            message_type = other.message_type(),
                            attempt = used,
                            "Unexpected reply to decision request"
                        );
                    }
                },
            }
        }

        CollectOutcome {
            choice: None,
            attempts_used: used,
        }
    }

    /// Out-of-band notice that an attempt deadline passed.
    async fn send_timeout_notice(&self, player: &PlayerId, endpoint: &Endpoint) {
        let notice = Message::new(
            self.sender.clone(),
            Body::Error(
                ErrorMessage::new(
                    ErrorCode::Timeout,
                    format!("Player {player} did not respond in time"),
                )
                .for_match(self.session.match_id.clone()),
            ),
        )
        .with_conversation(self.session.conversation_id.clone());

        // Best-effort under its own deadline; a hung participant must not
        // stall the retry loop.
        match timeout(self.config.attempt_timeout, self.client.notify(endpoint, &notice)).await {
            Ok(Ok(())) => {}
            Ok(Err(error)) => {
                debug!(player = %player, error = %error, "Timeout notice delivery failed")
            }
            Err(_elapsed) => {
                debug!(player = %player, "Timeout notice delivery timed out")
            }
        }
    }
}

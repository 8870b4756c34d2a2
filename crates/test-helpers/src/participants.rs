//! Scripted participants for driving match and league flows in tests.

use async_trait::async_trait;
use parity_core::{unwrap_payload, wrap_response, Envelope, Handler};
use parity_messages::{
    Ack, Body, ChooseParityResponse, ErrorCode, GameJoinAck, Message, Sender,
};
use parity_types::{rfc3339_now, PlayerId};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// One scripted reaction to a `CHOOSE_PARITY_CALL`.
#[derive(Debug, Clone)]
pub enum ChoiceReply {
    /// Respond immediately with this raw choice value (legal or not).
    Choice(String),
    /// Never respond; the collector's attempt timeout fires.
    Silent,
    /// Respond with this choice after the given delay.
    Delayed(Duration, String),
}

/// A player agent stand-in following a fixed script.
///
/// Each `CHOOSE_PARITY_CALL` pops the next scripted reply; an exhausted
/// script keeps answering with the fallback choice.
pub struct ScriptedPlayer {
    player_id: PlayerId,
    accept_invitations: bool,
    fallback_choice: String,
    script: Mutex<VecDeque<ChoiceReply>>,
    choice_calls: Mutex<u32>,
    timeout_notices: Mutex<u32>,
    game_overs: Mutex<Vec<Message>>,
}

impl ScriptedPlayer {
    /// A cooperative player that always answers with `choice`.
    pub fn answering(player_id: PlayerId, choice: &str) -> Self {
        Self {
            player_id,
            accept_invitations: true,
            fallback_choice: choice.to_string(),
            script: Mutex::new(VecDeque::new()),
            choice_calls: Mutex::new(0),
            timeout_notices: Mutex::new(0),
            game_overs: Mutex::new(Vec::new()),
        }
    }

    /// A player that follows `script`, then falls back to `fallback`.
    pub fn scripted(player_id: PlayerId, script: Vec<ChoiceReply>, fallback: &str) -> Self {
        let player = Self::answering(player_id, fallback);
        *player.script.lock().expect("script poisoned") = script.into();
        player
    }

    /// A player that declines every invitation.
    pub fn refusing(player_id: PlayerId) -> Self {
        Self {
            accept_invitations: false,
            ..Self::answering(player_id, "even")
        }
    }

    /// Number of `CHOOSE_PARITY_CALL`s received.
    pub fn choice_calls(&self) -> u32 {
        *self.choice_calls.lock().expect("counter poisoned")
    }

    /// Number of out-of-band timeout notices received.
    pub fn timeout_notices(&self) -> u32 {
        *self.timeout_notices.lock().expect("counter poisoned")
    }

    /// `GAME_OVER` messages received so far.
    pub fn game_overs(&self) -> Vec<Message> {
        self.game_overs.lock().expect("results poisoned").clone()
    }

    fn sender(&self) -> Sender {
        Sender::Player(self.player_id.clone())
    }
}

#[async_trait]
impl Handler for ScriptedPlayer {
    async fn handle(&self, envelope: Envelope) -> Envelope {
        let correlation = envelope.echo_correlation();
        let inbound = match Message::from_value(unwrap_payload(&envelope)) {
            Ok(message) => message,
            Err(_) => {
                let ack = Message::new(self.sender(), Body::Ack(Ack::default()));
                return wrap_response(ack.to_value().unwrap(), correlation);
            }
        };

        let reply_body = match &inbound.body {
            Body::GameInvitation(invitation) => Body::GameJoinAck(GameJoinAck {
                match_id: invitation.match_id.clone(),
                player_id: self.player_id.clone(),
                accept: self.accept_invitations,
                arrival_timestamp: rfc3339_now(),
            }),
            Body::ChooseParityCall(call) => {
                *self.choice_calls.lock().expect("counter poisoned") += 1;
                let reply = self
                    .script
                    .lock()
                    .expect("script poisoned")
                    .pop_front()
                    .unwrap_or(ChoiceReply::Choice(self.fallback_choice.clone()));
                let choice = match reply {
                    ChoiceReply::Choice(choice) => choice,
                    ChoiceReply::Delayed(delay, choice) => {
                        tokio::time::sleep(delay).await;
                        choice
                    }
                    ChoiceReply::Silent => {
                        // Outlive any sane attempt timeout; the collector
                        // drops this future when its timer fires.
                        tokio::time::sleep(Duration::from_secs(3600)).await;
                        self.fallback_choice.clone()
                    }
                };
                Body::ChooseParityResponse(ChooseParityResponse {
                    match_id: call.match_id.clone(),
                    choice,
                })
            }
            Body::GameOver(_) => {
                self.game_overs
                    .lock()
                    .expect("results poisoned")
                    .push(inbound.clone());
                Body::Ack(Ack::received())
            }
            Body::Error(error) if error.error_code == ErrorCode::Timeout => {
                *self.timeout_notices.lock().expect("counter poisoned") += 1;
                Body::Ack(Ack::received())
            }
            _ => Body::Ack(Ack::received()),
        };

        let reply = Message::new(self.sender(), reply_body)
            .with_conversation(inbound.conversation_id.clone());
        wrap_response(reply.to_value().unwrap(), correlation)
    }
}

/// A participant that acknowledges everything and records what it saw.
///
/// Used to observe coordinator broadcasts (standings updates, round and
/// league completion).
#[derive(Default)]
pub struct BroadcastRecorder {
    received: Mutex<Vec<Message>>,
}

impl BroadcastRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages received so far.
    pub fn received(&self) -> Vec<Message> {
        self.received.lock().expect("recorder poisoned").clone()
    }

    /// Received messages with the given `message_type` tag.
    pub fn received_of_type(&self, message_type: &str) -> Vec<Message> {
        self.received()
            .into_iter()
            .filter(|m| m.message_type() == message_type)
            .collect()
    }
}

#[async_trait]
impl Handler for BroadcastRecorder {
    async fn handle(&self, envelope: Envelope) -> Envelope {
        let correlation = envelope.echo_correlation();
        if let Ok(message) = Message::from_value(unwrap_payload(&envelope)) {
            self.received
                .lock()
                .expect("recorder poisoned")
                .push(message);
        }
        let ack = Message::new(
            Sender::Other("observer".to_string()),
            Body::Ack(Ack::received()),
        );
        wrap_response(ack.to_value().unwrap(), correlation)
    }
}

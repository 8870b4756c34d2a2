//! Inbound dispatch for the coordinator.
//!
//! Every inbound envelope gets a response: well-formed requests are
//! dispatched by message type, everything else comes back as a structured
//! error payload.

use crate::error::LeagueError;
use crate::manager::LeagueManager;
use async_trait::async_trait;
use parity_core::{
    method_for, unwrap_payload, wrap_response, AuditDirection, AuditEvent, Envelope, Handler,
};
use parity_messages::{
    Body, ErrorCode, ErrorMessage, LeagueQueryResponse, MatchResultAcknowledged, Message,
    PlayerRegisterResponse, QueryType, RefereeRegisterResponse, RegistrationStatus, Sender,
};
use parity_types::ConversationId;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Wires an `Arc<LeagueManager>` into the transport's handler seam.
pub struct LeagueHandler(pub Arc<LeagueManager>);

#[async_trait]
impl Handler for LeagueHandler {
    async fn handle(&self, envelope: Envelope) -> Envelope {
        self.0.audit.record(AuditEvent {
            direction: AuditDirection::Inbound,
            endpoint: None,
            envelope: &envelope,
        });

        let correlation = envelope.echo_correlation();
        let payload = unwrap_payload(&envelope);
        let reply = match Message::from_value(payload.clone()) {
            Ok(inbound) => self.dispatch(inbound).await,
            Err(parse_error) => classify_failure(&payload, &parse_error.to_string()),
        };

        let response = match reply.to_value() {
            Ok(value) => wrap_response(value, correlation),
            Err(serialize_error) => wrap_response(
                serde_json::json!({
                    "message_type": "ERROR",
                    "error_code": "INTERNAL_ERROR",
                    "error_message": serialize_error.to_string(),
                }),
                correlation,
            ),
        };
        self.0.audit.record(AuditEvent {
            direction: AuditDirection::Outbound,
            endpoint: None,
            envelope: &response,
        });
        response
    }
}

impl LeagueHandler {
    async fn dispatch(&self, inbound: Message) -> Message {
        let manager = &self.0;
        let conversation = inbound.conversation_id.clone();

        let reply_body = match inbound.body {
            Body::RefereeRegisterRequest(request) => {
                let (referee_id, auth_token) =
                    manager.register_referee(request.referee_meta).await;
                Body::RefereeRegisterResponse(RefereeRegisterResponse {
                    status: RegistrationStatus::Accepted,
                    referee_id,
                    auth_token,
                    league_id: manager.config.league_id.clone(),
                    reason: None,
                })
            }

            Body::PlayerRegisterRequest(request) => {
                let (player_id, auth_token) = manager.register_player(request.player_meta).await;
                Body::PlayerRegisterResponse(PlayerRegisterResponse {
                    status: RegistrationStatus::Accepted,
                    player_id,
                    auth_token,
                    league_id: manager.config.league_id.clone(),
                    reason: None,
                })
            }

            Body::MatchResultReport(report) => {
                match (inbound.sender.as_referee(), inbound.auth_token.as_ref()) {
                    (Some(referee_id), Some(token)) => {
                        match manager
                            .record_match_result(referee_id, token, &report.match_id, report.result)
                            .await
                        {
                            Ok(()) => Body::MatchResultAcknowledged(MatchResultAcknowledged {
                                match_id: report.match_id,
                            }),
                            Err(error) => error_body(&error),
                        }
                    }
                    _ => error_body(&LeagueError::AuthenticationFailed {
                        identity: inbound.sender.to_string(),
                    }),
                }
            }

            Body::LeagueQuery(query) => match inbound.auth_token.as_ref() {
                Some(token) if manager.validate_player(&query.player_id, token).await => {
                    let data = match query.query_type {
                        QueryType::GetStandings => {
                            serde_json::to_value(manager.standings().await).unwrap_or(Value::Null)
                        }
                        QueryType::GetSchedule => serde_json::to_value(manager.schedule_data().await)
                            .unwrap_or(Value::Null),
                        QueryType::GetNextMatch => manager
                            .next_match(&query.player_id)
                            .await
                            .and_then(|entry| serde_json::to_value(entry).ok())
                            .unwrap_or(Value::Null),
                        QueryType::GetPlayerStats => {
                            let target = query
                                .target_player_id
                                .unwrap_or_else(|| query.player_id.clone());
                            manager.player_stats(&target).await.unwrap_or(Value::Null)
                        }
                    };
                    Body::LeagueQueryResponse(LeagueQueryResponse::new(query.query_type, data))
                }
                _ => error_body(&LeagueError::AuthenticationFailed {
                    identity: query.player_id.to_string(),
                }),
            },

            other => {
                debug!(
                    message_type = other.message_type(),
                    "Message type not handled by the coordinator"
                );
                error_body(&LeagueError::UnknownMessageType(
                    other.message_type().to_string(),
                ))
            }
        };

        Message::new(Sender::LeagueManager, reply_body).with_conversation(conversation)
    }
}

fn error_body(error: &LeagueError) -> Body {
    Body::Error(ErrorMessage::new(error.error_code(), error.to_string()))
}

/// Build the error reply for a payload that did not parse as a message.
///
/// Distinguishes an unknown `message_type` from an unknown query subtype
/// and from a merely malformed body, so callers get the most specific
/// error the taxonomy offers.
fn classify_failure(payload: &Value, parse_error: &str) -> Message {
    let conversation = payload
        .get("conversation_id")
        .and_then(Value::as_str)
        .map(ConversationId::new)
        .unwrap_or_else(ConversationId::random);

    let (code, detail) = match payload.get("message_type").and_then(Value::as_str) {
        None => (
            ErrorCode::UnknownMessageType,
            "message_type missing".to_string(),
        ),
        Some(message_type) if method_for(message_type).is_none() => (
            ErrorCode::UnknownMessageType,
            format!("unknown message type: {message_type}"),
        ),
        Some("LEAGUE_QUERY") => {
            let query_type = payload
                .get("query_type")
                .and_then(Value::as_str)
                .unwrap_or("<missing>");
            match query_type {
                "GET_STANDINGS" | "GET_SCHEDULE" | "GET_NEXT_MATCH" | "GET_PLAYER_STATS" => (
                    ErrorCode::InternalError,
                    format!("malformed query: {parse_error}"),
                ),
                other => (
                    ErrorCode::UnknownQuery,
                    format!("unknown query type: {other}"),
                ),
            }
        }
        Some(message_type) => (
            ErrorCode::InternalError,
            format!("malformed {message_type}: {parse_error}"),
        ),
    };

    Message::new(
        Sender::LeagueManager,
        Body::Error(ErrorMessage::new(code, detail)),
    )
    .with_conversation(conversation)
}

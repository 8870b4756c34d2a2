//! JSON-RPC 2.0 envelope codec.
//!
//! Semantic messages travel inside a generic correlated request/response
//! frame. The `message_type` of the payload selects the JSON-RPC method via
//! a total mapping; unrecognized types resolve to [`UNKNOWN_METHOD`], never
//! an error.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Method name used for payloads whose `message_type` is not in the table.
pub const UNKNOWN_METHOD: &str = "unknown";

/// The JSON-RPC 2.0 version tag.
const JSONRPC_VERSION: &str = "2.0";

/// A JSON-RPC 2.0 frame.
///
/// Exactly one of `params` (request), `result` (success response) or
/// `error` (error response) is populated by the codec. `id` is the
/// correlation id: opaque, preserved byte-for-byte across a
/// request/response pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub jsonrpc: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
}

/// Map a semantic `message_type` onto its JSON-RPC method name.
///
/// Request and response variants of one exchange share a method, mirroring
/// standard JSON-RPC routing while the payload keeps the semantic tag.
pub fn method_for(message_type: &str) -> Option<&'static str> {
    let method = match message_type {
        // Registration
        "REFEREE_REGISTER_REQUEST" | "REFEREE_REGISTER_RESPONSE" => "register_referee",
        "LEAGUE_REGISTER_REQUEST" | "LEAGUE_REGISTER_RESPONSE" => "register_player",

        // Match assignment
        "MATCH_ASSIGNMENT" | "MATCH_ASSIGNMENT_ACK" => "assign_match",

        // Game flow
        "GAME_INVITATION" | "GAME_JOIN_ACK" => "handle_game_invitation",
        "CHOOSE_PARITY_CALL" | "CHOOSE_PARITY_RESPONSE" => "choose_parity",
        "GAME_OVER" => "notify_match_result",
        "MATCH_RESULT_REPORT" | "MATCH_RESULT_ACKNOWLEDGED" => "report_match_result",

        // League progression
        "ROUND_ANNOUNCEMENT" => "announce_round",
        "ROUND_COMPLETED" => "notify_round_completed",
        "LEAGUE_STANDINGS_UPDATE" => "update_standings",
        "LEAGUE_COMPLETED" => "notify_league_completed",

        // Queries and acknowledgments
        "LEAGUE_QUERY" | "LEAGUE_QUERY_RESPONSE" => "query_league",
        "ACK" => "acknowledge",
        "ERROR" => "error",

        _ => return None,
    };
    Some(method)
}

/// Wrap a payload in a request envelope.
///
/// The method is looked up from the payload's `message_type`; a missing or
/// unrecognized tag falls back to [`UNKNOWN_METHOD`]. Never fails.
pub fn wrap_request(payload: Value, correlation_id: Value) -> Envelope {
    let method = payload
        .get("message_type")
        .and_then(Value::as_str)
        .and_then(method_for)
        .unwrap_or(UNKNOWN_METHOD);

    Envelope {
        jsonrpc: JSONRPC_VERSION.to_string(),
        method: Some(method.to_string()),
        params: Some(payload),
        result: None,
        error: None,
        id: Some(correlation_id),
    }
}

/// Wrap a payload in a success-response envelope under the same correlation
/// id the request was dispatched with.
pub fn wrap_response(result: Value, correlation_id: Value) -> Envelope {
    Envelope {
        jsonrpc: JSONRPC_VERSION.to_string(),
        method: None,
        params: None,
        result: Some(result),
        error: None,
        id: Some(correlation_id),
    }
}

/// Wrap a payload in an error-response envelope.
pub fn wrap_error(error: Value, correlation_id: Value) -> Envelope {
    Envelope {
        jsonrpc: JSONRPC_VERSION.to_string(),
        method: None,
        params: None,
        result: None,
        error: Some(error),
        id: Some(correlation_id),
    }
}

/// Extract the semantic payload from an envelope.
///
/// Request params take precedence, then the success result, then the error
/// payload; an envelope carrying none of the three is returned whole.
/// Never fails.
pub fn unwrap_payload(envelope: &Envelope) -> Value {
    if let Some(params) = &envelope.params {
        params.clone()
    } else if let Some(result) = &envelope.result {
        result.clone()
    } else if let Some(error) = &envelope.error {
        error.clone()
    } else {
        serde_json::to_value(envelope).unwrap_or(Value::Null)
    }
}

/// Whether a raw JSON value is an envelope (protocol version tag present
/// and recognized).
pub fn is_envelope(value: &Value) -> bool {
    value.get("jsonrpc").and_then(Value::as_str) == Some(JSONRPC_VERSION)
}

impl Envelope {
    /// The correlation id, if one is present.
    pub fn correlation_id(&self) -> Option<&Value> {
        self.id.as_ref()
    }

    /// Echo this envelope's correlation id, or JSON null if it carried none.
    pub fn echo_correlation(&self) -> Value {
        self.id.clone().unwrap_or(Value::Null)
    }
}

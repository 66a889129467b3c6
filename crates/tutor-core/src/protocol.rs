//! Transport protocol — JSON-RPC style request/response plus server-pushed
//! events.
//!
//! Wire format:
//!
//! Client → Server (RPC request):
//!   { "id": "req-123", "method": "session.send", "params": { "learner_id": "alice", "message": "ready" } }
//!
//! Server → Client (RPC response):
//!   { "id": "req-123", "result": { "accepted": true } }
//!   { "id": "req-123", "error": { "code": -1, "message": "not found" } }
//!
//! Server → Client (event push, no id — the three transport egress forms
//! from spec §6):
//!   { "event": "system_message", "data": { "learner_id": "alice", "content": "..." } }
//!   { "event": "state_change", "data": { "learner_id": "alice", "state": "AwaitingAnswer" } }
//!   { "event": "error", "data": { "learner_id": "alice", "reason": "..." } }
//!
//! Authentication:
//!   { "token": "secret" }  (shorthand)
//!   { "id": "1", "method": "auth", "params": { "token": "secret" } }  (RPC style)

use serde::{Deserialize, Serialize};

use crate::psm::State;

/// RPC request from client.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcRequest {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// RPC response to client.
#[derive(Debug, Clone, Serialize)]
pub struct RpcResponse {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    pub fn ok(id: impl Into<String>, result: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            result: Some(result),
            error: None,
        }
    }

    pub fn err(id: impl Into<String>, code: i32, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            result: None,
            error: Some(RpcError {
                code,
                message: message.into(),
            }),
        }
    }

    pub fn method_not_found(id: impl Into<String>, method: &str) -> Self {
        Self::err(id, -32601, format!("method not found: {}", method))
    }

    pub fn internal_error(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::err(id, -32603, message)
    }

    pub fn auth_error(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::err(id, -32000, message)
    }

    pub fn not_found(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::err(id, -32001, message)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
}

/// Server-pushed event (no id, no request correlation). Carries one of the
/// three transport egress forms from spec §6.
#[derive(Debug, Clone, Serialize)]
pub struct EventMessage {
    pub event: String,
    pub data: serde_json::Value,
}

impl EventMessage {
    pub fn new(event: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }

    /// `SystemMessage{content}` — a tutor utterance to render.
    pub fn system_message(learner_id: &str, content: impl Into<String>) -> Self {
        Self::new(
            "system_message",
            serde_json::json!({ "learner_id": learner_id, "content": content.into() }),
        )
    }

    /// `StateChange{state}` — the new PSM state label, for UI affordances.
    pub fn state_change(learner_id: &str, state: State) -> Self {
        Self::new(
            "state_change",
            serde_json::json!({ "learner_id": learner_id, "state": state }),
        )
    }

    /// `Error{reason}` — a user-visible degradation notice.
    pub fn error(learner_id: &str, reason: impl Into<String>) -> Self {
        Self::new(
            "error",
            serde_json::json!({ "learner_id": learner_id, "reason": reason.into() }),
        )
    }

    pub fn auth_result(ok: bool, error: Option<&str>) -> Self {
        Self::new("auth", serde_json::json!({ "ok": ok, "error": error }))
    }

    pub fn info(version: &str) -> Self {
        Self::new("info", serde_json::json!({ "version": version }))
    }

    pub fn pong() -> Self {
        Self::new("pong", serde_json::json!({}))
    }
}

/// Unified incoming message. Serde tries RPC first, then the auth shorthand.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IncomingMessage {
    Rpc(RpcRequest),
    Auth { token: Option<String> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rpc_request_deserializes() {
        let json = r#"{"id":"1","method":"session.send","params":{"learner_id":"a","message":"hi"}}"#;
        let req: RpcRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.id, "1");
        assert_eq!(req.method, "session.send");
    }

    #[test]
    fn incoming_message_prefers_rpc_shape() {
        let json = r#"{"id":"1","method":"health","params":{}}"#;
        let msg: IncomingMessage = serde_json::from_str(json).unwrap();
        assert!(matches!(msg, IncomingMessage::Rpc(_)));
    }

    #[test]
    fn incoming_message_falls_back_to_auth_shorthand() {
        let json = r#"{"token":"secret"}"#;
        let msg: IncomingMessage = serde_json::from_str(json).unwrap();
        assert!(matches!(msg, IncomingMessage::Auth { token: Some(ref t) } if t == "secret"));
    }

    #[test]
    fn event_message_state_change_embeds_state() {
        let event = EventMessage::state_change("alice", State::AwaitingAnswer);
        assert_eq!(event.event, "state_change");
        assert_eq!(event.data["learner_id"], "alice");
    }
}

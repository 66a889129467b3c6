//! RPC router — dispatches JSON-RPC method calls to handlers.
//!
//! Each method (`session.start`, `session.send`, ...) is a dedicated async
//! function; the router just maps a method name to one.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::broadcast;
use tracing::info;

use tutor_core::protocol::EventMessage;
use tutor_core::types::{SessionKey, Topic};
use tutor_session::{InitArgs, StartOutcome, Supervisor};

/// Connection context passed to RPC handlers.
pub struct ConnectionContext {
    pub authenticated: bool,
    pub supervisor: Arc<Supervisor>,
    pub events_tx: broadcast::Sender<EventMessage>,
}

/// Result type for RPC handlers.
pub type RpcResult = Result<Value, (i32, String)>;

/// Route an RPC method call to the appropriate handler.
pub async fn route_rpc(method: &str, params: Value, ctx: &ConnectionContext) -> RpcResult {
    if !ctx.authenticated && method != "auth" {
        return Err((-32000, "Not authenticated".to_string()));
    }

    match method {
        "session.start" => handle_session_start(params, ctx).await,
        "session.send" => handle_session_send(params, ctx).await,
        "session.snapshot" => handle_session_snapshot(params, ctx).await,
        "session.shutdown" => handle_session_shutdown(params, ctx).await,
        "sessions.list" => handle_sessions_list(ctx).await,
        "health" => handle_health(ctx).await,
        _ => Err((-32601, format!("Method not found: {}", method))),
    }
}

/// Convert an RPC result to an `RpcResponse`.
pub fn to_response(id: &str, result: RpcResult) -> tutor_core::protocol::RpcResponse {
    use tutor_core::protocol::RpcResponse;
    match result {
        Ok(value) => RpcResponse::ok(id, value),
        Err((code, message)) => RpcResponse::err(id, code, message),
    }
}

// ---------------------------------------------------------------------------
// session.start — start or resume a learner's session
// ---------------------------------------------------------------------------

async fn handle_session_start(params: Value, ctx: &ConnectionContext) -> RpcResult {
    let learner_id = params["learner_id"]
        .as_str()
        .ok_or_else(|| (-32602, "Missing required param: learner_id".to_string()))?;

    let topic = params.get("topic").and_then(|t| {
        Some(Topic {
            id: t.get("id")?.as_str()?.to_string(),
            name: t.get("name")?.as_str()?.to_string(),
            tier: t.get("tier").and_then(Value::as_u64).unwrap_or(1) as u32,
        })
    });

    let sink = {
        let events_tx = ctx.events_tx.clone();
        std::sync::Arc::new(move |event: EventMessage| {
            let _ = events_tx.send(event);
        })
    };

    let key = SessionKey::new(learner_id);
    let outcome = ctx
        .supervisor
        .start_session(key.clone(), InitArgs { topic, transport_sink: Some(sink) })
        .await;

    info!(learner_id, "session.start");

    Ok(serde_json::json!({
        "learner_id": learner_id,
        "started": matches!(outcome, StartOutcome::Started(_)),
    }))
}

// ---------------------------------------------------------------------------
// session.send — deliver a learner message to a running session
// ---------------------------------------------------------------------------

async fn handle_session_send(params: Value, ctx: &ConnectionContext) -> RpcResult {
    let learner_id = params["learner_id"]
        .as_str()
        .ok_or_else(|| (-32602, "Missing required param: learner_id".to_string()))?;
    let message = params["message"]
        .as_str()
        .ok_or_else(|| (-32602, "Missing required param: message".to_string()))?;

    let key = SessionKey::new(learner_id);
    let handle = ctx
        .supervisor
        .lookup(&key)
        .ok_or_else(|| (-32001, format!("Session not found: {}", learner_id)))?;

    handle
        .handle_user_message(message)
        .await
        .map_err(|_| (-32002, format!("Session '{}' is no longer accepting messages", learner_id)))?;

    Ok(serde_json::json!({ "ok": true }))
}

// ---------------------------------------------------------------------------
// session.snapshot — read-only introspection of a learner's current state
// ---------------------------------------------------------------------------

async fn handle_session_snapshot(params: Value, ctx: &ConnectionContext) -> RpcResult {
    let learner_id = params["learner_id"]
        .as_str()
        .ok_or_else(|| (-32602, "Missing required param: learner_id".to_string()))?;

    let key = SessionKey::new(learner_id);
    let handle = ctx
        .supervisor
        .lookup(&key)
        .ok_or_else(|| (-32001, format!("Session not found: {}", learner_id)))?;

    let snapshot = handle
        .get_snapshot()
        .await
        .map_err(|_| (-32002, format!("Session '{}' is no longer accepting messages", learner_id)))?;

    serde_json::to_value(snapshot).map_err(|e| (-32603, e.to_string()))
}

// ---------------------------------------------------------------------------
// session.shutdown — request a graceful end to a learner's session
// ---------------------------------------------------------------------------

async fn handle_session_shutdown(params: Value, ctx: &ConnectionContext) -> RpcResult {
    let learner_id = params["learner_id"]
        .as_str()
        .ok_or_else(|| (-32602, "Missing required param: learner_id".to_string()))?;

    let key = SessionKey::new(learner_id);
    let stopped = ctx.supervisor.stop_session(&key).await;
    if stopped {
        Ok(serde_json::json!({ "ok": true }))
    } else {
        Err((-32001, format!("Session not found: {}", learner_id)))
    }
}

// ---------------------------------------------------------------------------
// sessions.list — list learner ids with a running session
// ---------------------------------------------------------------------------

async fn handle_sessions_list(ctx: &ConnectionContext) -> RpcResult {
    let sessions: Vec<String> = ctx
        .supervisor
        .active_ids()
        .into_iter()
        .map(|k| k.as_str().to_string())
        .collect();
    Ok(serde_json::json!({ "sessions": sessions }))
}

// ---------------------------------------------------------------------------
// health — gateway health check
// ---------------------------------------------------------------------------

async fn handle_health(ctx: &ConnectionContext) -> RpcResult {
    Ok(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "sessions": ctx.supervisor.active_ids().len(),
    }))
}

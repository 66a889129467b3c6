//! WebSocket connection handling — the JSON-RPC request/response channel
//! plus server-pushed `EventMessage`s, fanned out to every connected client
//! from one shared broadcast channel.

use std::sync::Arc;

use axum::extract::ws::{Message as WsMessage, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use tracing::{info, warn};

use tutor_core::protocol::{EventMessage, IncomingMessage, RpcResponse};
use tutor_session::Supervisor;

use crate::auth::ResolvedAuth;
use crate::rpc::{self, ConnectionContext};

/// Shared state for WebSocket connections.
pub struct WsState {
    pub auth: ResolvedAuth,
    pub supervisor: Arc<Supervisor>,
    pub port: u16,
    /// Broadcast channel every running session's transport sink feeds, and
    /// every connected client subscribes to. Events carry `learner_id`, so a
    /// client filters down to the sessions it cares about.
    pub events_tx: broadcast::Sender<EventMessage>,
    pub started_at: std::time::Instant,
}

/// Handle a WebSocket connection end to end.
pub async fn handle_connection(socket: WebSocket, state: Arc<WsState>) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    let mut events_rx = state.events_tx.subscribe();

    let info_event = EventMessage::info(env!("CARGO_PKG_VERSION"));
    if let Ok(json) = serde_json::to_string(&info_event) {
        let _ = ws_tx.send(WsMessage::Text(json)).await;
    }

    let mut authenticated = matches!(state.auth.mode, tutor_core::AuthMode::None);

    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(WsMessage::Text(text))) => {
                        let ctx = ConnectionContext {
                            authenticated,
                            supervisor: state.supervisor.clone(),
                            events_tx: state.events_tx.clone(),
                        };
                        let responses = handle_text_message(&text, &state, &mut authenticated, ctx).await;
                        for response_json in responses {
                            if ws_tx.send(WsMessage::Text(response_json)).await.is_err() {
                                return;
                            }
                        }
                    }
                    Some(Ok(WsMessage::Ping(_))) => {
                        let pong = EventMessage::pong();
                        if let Ok(json) = serde_json::to_string(&pong) {
                            let _ = ws_tx.send(WsMessage::Text(json)).await;
                        }
                    }
                    Some(Ok(WsMessage::Close(_))) => {
                        info!("client disconnected");
                        return;
                    }
                    Some(Err(e)) => {
                        warn!("websocket error: {}", e);
                        return;
                    }
                    None => return,
                    _ => {}
                }
            }

            event = events_rx.recv() => {
                match event {
                    Ok(event_msg) => {
                        if let Ok(json) = serde_json::to_string(&event_msg) {
                            if ws_tx.send(WsMessage::Text(json)).await.is_err() {
                                return;
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("client lagged, dropped {} events", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        info!("event broadcast closed");
                        return;
                    }
                }
            }
        }
    }
}

/// Handle a text message. Returns JSON strings to send back to the client.
async fn handle_text_message(
    text: &str,
    state: &Arc<WsState>,
    authenticated: &mut bool,
    ctx: ConnectionContext,
) -> Vec<String> {
    let mut responses = Vec::new();

    match serde_json::from_str::<IncomingMessage>(text) {
        Ok(IncomingMessage::Rpc(req)) => {
            if req.method == "auth" {
                let token = req.params["token"].as_str();
                match state.auth.verify_token(token) {
                    Ok(()) => {
                        *authenticated = true;
                        let resp = RpcResponse::ok(&req.id, serde_json::json!({ "ok": true }));
                        if let Ok(json) = serde_json::to_string(&resp) {
                            responses.push(json);
                        }
                        info!("client authenticated");
                    }
                    Err(e) => {
                        let resp = RpcResponse::auth_error(&req.id, e.to_string());
                        if let Ok(json) = serde_json::to_string(&resp) {
                            responses.push(json);
                        }
                        warn!("auth failed: {}", e);
                    }
                }
                return responses;
            }

            let rpc_ctx = ConnectionContext {
                authenticated: *authenticated,
                supervisor: ctx.supervisor,
                events_tx: ctx.events_tx,
            };
            let result = rpc::route_rpc(&req.method, req.params, &rpc_ctx).await;
            let resp = rpc::to_response(&req.id, result);
            if let Ok(json) = serde_json::to_string(&resp) {
                responses.push(json);
            }
        }

        Ok(IncomingMessage::Auth { token }) => match state.auth.verify_token(token.as_deref()) {
            Ok(()) => {
                *authenticated = true;
                let evt = EventMessage::auth_result(true, None);
                if let Ok(json) = serde_json::to_string(&evt) {
                    responses.push(json);
                }
                info!("client authenticated (shorthand)");
            }
            Err(e) => {
                let evt = EventMessage::auth_result(false, Some(&e.to_string()));
                if let Ok(json) = serde_json::to_string(&evt) {
                    responses.push(json);
                }
                warn!("auth failed: {}", e);
            }
        },

        Err(_) => {
            warn!("unparseable message: {}", &text[..text.len().min(100)]);
        }
    }

    responses
}

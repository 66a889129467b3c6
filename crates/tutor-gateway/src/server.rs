//! Gateway server: axum router, bind-address resolution, CORS.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{State, WebSocketUpgrade},
    response::{Html, IntoResponse},
    routing::get,
    Json, Router,
};
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use tutor_core::protocol::EventMessage;
use tutor_core::{GatewayConfig, SessionCoreConfig};
use tutor_llm::AnthropicProvider;
use tutor_session::{FilePersistence, NullPersistence, PersistenceStore, Supervisor};
use tutor_tools::{ExecutorConfig, ToolClient, ToolExecutor};

use crate::auth::ResolvedAuth;
use crate::ws::{handle_connection, WsState};

pub struct ExtendedConfig {
    pub gateway: GatewayConfig,
    pub session: SessionCoreConfig,
    pub anthropic_api_key: Option<String>,
    pub model: Option<String>,
    pub persistence_dir: Option<std::path::PathBuf>,
}

impl Default for ExtendedConfig {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig::default(),
            session: SessionCoreConfig::default(),
            anthropic_api_key: None,
            model: None,
            persistence_dir: None,
        }
    }
}

pub async fn start_gateway(config: ExtendedConfig) -> anyhow::Result<()> {
    let env_token = std::env::var("TUTOR_GATEWAY_TOKEN").ok();
    let auth = ResolvedAuth::from_config(&config.gateway.auth, env_token);

    let api_key = config
        .anthropic_api_key
        .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
        .ok_or_else(|| anyhow::anyhow!("ANTHROPIC_API_KEY not set"))?;
    let model = config
        .model
        .or_else(|| std::env::var("TUTOR_MODEL").ok())
        .unwrap_or_else(|| "claude-3-5-sonnet-20241022".to_string());

    let session_config = Arc::new(config.session);

    let provider = Arc::new(AnthropicProvider::new(api_key));
    let tool_client = Arc::new(ToolClient::with_default_tools(provider, model));
    let executor_config = ExecutorConfig {
        concurrency_cap: session_config.executor_concurrency_cap,
        queue_cap: session_config.executor_queue_cap,
        default_deadline_ms: session_config.tool_deadline_ms,
    };
    let executor = Arc::new(ToolExecutor::new(tool_client.clone(), executor_config));

    let persistence: Arc<dyn PersistenceStore> = match &config.persistence_dir {
        Some(dir) if session_config.persistence_enabled => Arc::new(FilePersistence::new(dir.clone())),
        _ => Arc::new(NullPersistence),
    };

    let supervisor = Arc::new(Supervisor::new(executor, tool_client, session_config, persistence));

    let (events_tx, _) = broadcast::channel::<EventMessage>(1024);

    let state = Arc::new(WsState {
        auth,
        supervisor,
        port: config.gateway.port,
        events_tx,
        started_at: std::time::Instant::now(),
    });

    let app = Router::new()
        .route("/", get(index_handler))
        .route("/ws", get(ws_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any))
        .with_state(state);

    let bind_addr: SocketAddr = format!("{}:{}", config.gateway.bind.to_addr(), config.gateway.port)
        .parse()
        .expect("invalid bind address");

    info!("tutor gateway v{} starting", env!("CARGO_PKG_VERSION"));
    info!("  listening on: {}", bind_addr);
    info!("  websocket: ws://{}/ws", bind_addr);
    info!("  auth mode: {:?}", config.gateway.auth.mode);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<WsState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(socket, state))
}

async fn health_handler(State(state): State<Arc<WsState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "sessions": state.supervisor.active_ids().len(),
        "uptime_secs": state.started_at.elapsed().as_secs(),
    }))
}

async fn index_handler(State(state): State<Arc<WsState>>) -> Html<String> {
    let sessions: Vec<String> = state
        .supervisor
        .active_ids()
        .into_iter()
        .map(|k| k.as_str().to_string())
        .collect();

    Html(format!(
        r#"<!DOCTYPE html><html><head><title>Tutor Gateway</title>
<style>
body {{ font-family: monospace; background: #1a1a2e; color: #eee; padding: 20px; max-width: 900px; margin: 0 auto; }}
h1 {{ color: #f39c12; }} h2 {{ color: #3498db; }}
a {{ color: #3498db; }} code {{ background: #0f3460; padding: 2px 6px; border-radius: 4px; }}
.info {{ background: #16213e; padding: 15px; border-radius: 8px; margin: 15px 0; }}
#output {{ background: #0f3460; padding: 15px; border-radius: 8px; min-height: 200px; max-height: 400px; overflow-y: auto; white-space: pre-wrap; font-size: 13px; }}
textarea {{ width: 100%; min-height: 60px; background: #0f3460; color: #eee; border: 1px solid #333; border-radius: 4px; padding: 10px; font-size: 14px; resize: vertical; }}
button {{ background: #f39c12; border: none; padding: 8px 16px; border-radius: 4px; cursor: pointer; font-size: 14px; margin: 5px 5px 5px 0; }}
button:hover {{ background: #e67e22; }}
</style></head><body>
<h1>Tutor Gateway v{version}</h1>
<div class="info">
<p>WebSocket: <code>ws://localhost:{port}/ws</code></p>
<p>Protocol: JSON-RPC (session.start / session.send / session.snapshot / session.shutdown)</p>
</div>
<h2>Active sessions</h2>
<ul>{sessions}</ul>
<h2>Try it</h2>
<div>
<textarea id="msg" placeholder="learner id, then message..."></textarea>
<button onclick="send()">Send</button>
<button onclick="document.getElementById('output').textContent=''">Clear</button>
</div>
<div id="output"></div>
<script>
let ws = null;
let reqId = 0;
function init() {{
    ws = new WebSocket('ws://'+location.host+'/ws');
    ws.onopen = () => {{ ws.send(JSON.stringify({{token: null}})); }};
    ws.onmessage = (e) => {{
        const d = JSON.parse(e.data);
        const out = document.getElementById('output');
        out.textContent += JSON.stringify(d) + '\n';
        out.scrollTop = out.scrollHeight;
    }};
    ws.onclose = () => {{ setTimeout(init, 1000); }};
}}
function send() {{
    if (!ws || ws.readyState !== 1) return;
    const parts = document.getElementById('msg').value.split('\n');
    const learner = parts[0] || 'web-console';
    const message = parts.slice(1).join('\n');
    reqId++;
    ws.send(JSON.stringify({{id:'req-'+reqId, method:'session.start', params:{{learner_id:learner}}}}));
    reqId++;
    ws.send(JSON.stringify({{id:'req-'+reqId, method:'session.send', params:{{learner_id:learner, message:message}}}}));
}}
init();
</script></body></html>"#,
        version = env!("CARGO_PKG_VERSION"),
        port = state.port,
        sessions = if sessions.is_empty() { "<em>none yet</em>".to_string() } else { sessions.iter().map(|s| format!("<li>{}</li>", s)).collect::<Vec<_>>().join("\n") },
    ))
}

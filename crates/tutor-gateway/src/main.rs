//! Tutor Gateway — WebSocket server for running tutoring sessions.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tutor_core::{AuthConfig, AuthMode, BindMode, GatewayConfig, SessionCoreConfig};
use tutor_gateway::{start_gateway, ExtendedConfig};

#[derive(Parser)]
#[command(name = "tutor-gateway", about = "Session Core tutoring gateway")]
struct Cli {
    #[arg(short, long, default_value = "18080")]
    port: u16,
    #[arg(short, long, default_value = "lan")]
    bind: String,
    #[arg(short, long)]
    token: Option<String>,
    #[arg(long)]
    no_auth: bool,
    #[arg(long)]
    model: Option<String>,
    #[arg(long)]
    persistence_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tutor_gateway=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let bind_mode = match cli.bind.as_str() {
        "loopback" | "localhost" | "127.0.0.1" => BindMode::Loopback,
        _ => BindMode::Lan,
    };
    let auth = if cli.no_auth {
        AuthConfig { mode: AuthMode::None, token: None }
    } else {
        AuthConfig { mode: AuthMode::Token, token: cli.token }
    };

    let session_config = SessionCoreConfig::load("session-core.toml").unwrap_or_default();

    let config = ExtendedConfig {
        gateway: GatewayConfig { port: cli.port, bind: bind_mode, auth },
        session: session_config,
        anthropic_api_key: std::env::var("ANTHROPIC_API_KEY").ok(),
        model: cli.model,
        persistence_dir: cli.persistence_dir,
    };

    start_gateway(config).await
}

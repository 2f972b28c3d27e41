//! Lipyx Web Server
//!
//! Run with: cargo run -p lipyx-web --bin lipyx-web

use lipyx_web::{config::ServerConfig, router::build_router, state::AppState};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("lipyx=debug,tower_http=info,info")),
        )
        .init();

    info!("Starting Lipyx prediction server...");

    let config = ServerConfig::load()?;
    let state = AppState::from_config(&config)?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    info!("Server listening on http://{}", config.bind);

    axum::serve(listener, app).await?;

    Ok(())
}

use anyhow::Context;
use dotenvy::dotenv;
use kings_landing::{config::ServerConfig, create_app, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

const LIMITER_PRUNE_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,kings_landing=debug,tower_http=info"));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    let config = ServerConfig::from_env();
    if config.openai_api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY not set, the AI endpoint will serve fallback ideas");
    }
    let port = config.port;
    let state = Arc::new(AppState::new(config));

    let state_for_pruning = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(LIMITER_PRUNE_INTERVAL);
        loop {
            interval.tick().await;
            let removed = state_for_pruning.ai_limiter.prune();
            if removed > 0 {
                tracing::debug!("Pruned {} idle rate limiter entries", removed);
            }
        }
    });

    let app = create_app(state);

    tracing::info!("Starting server on port {}", port);
    let listener = TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .context("Server error")?;
    Ok(())
}

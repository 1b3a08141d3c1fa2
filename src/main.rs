use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::info;

use spotly::config::AppConfig;
use spotly::server::{AppState, app_routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env().context("Failed to load configuration")?;

    eprintln!("📍 Spotly v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Backend: {:?}", config.backend);
    eprintln!("   API: http://0.0.0.0:{}/api/onboarding", config.port);

    let state = AppState::from_config(&config)
        .await
        .context("Failed to initialise the store")?;

    // ── Completion log ──────────────────────────────────────────────────
    let mut completions = state.wizards.subscribe();
    tokio::spawn(async move {
        loop {
            match completions.recv().await {
                Ok(event) => {
                    info!(user_id = %event.user_id, completed_at = %event.completed_at, "User finished onboarding");
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Completion listener lagged");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    // ── Idle wizard sweep ───────────────────────────────────────────────
    let wizards = Arc::clone(&state.wizards);
    let max_idle = config.wizard_idle;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(max_idle.min(Duration::from_secs(60)));
        loop {
            ticker.tick().await;
            let evicted = wizards.evict_idle(max_idle).await;
            if evicted > 0 {
                let remaining = wizards.len().await;
                info!(evicted, remaining, "Dropped idle onboarding wizards");
            }
        }
    });

    // ── HTTP server ─────────────────────────────────────────────────────
    let app = app_routes(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Spotly listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use upwords_backend::{config::Config, dictionary::Dictionary, routes, AppState};

/// How often expired turns and finished sessions are swept
pub const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "upwords_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Upwords backend server...");

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded");

    // Load dictionary; a missing or malformed word list is fatal
    let dictionary = Dictionary::load(&config.game.dictionary_path, config.game.min_word_length)
        .await
        .with_context(|| {
            format!(
                "failed to load dictionary from {}",
                config.game.dictionary_path
            )
        })?;
    tracing::info!("Dictionary loaded successfully");

    // Create application state
    let state = Arc::new(AppState::new(config.clone(), dictionary));

    // Spawn background task to pass timed-out turns and drop finished sessions
    let sweep_state = state.clone();
    tokio::spawn(async move {
        session_sweep_task(sweep_state).await;
    });

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router
    let app = Router::new()
        .merge(routes::create_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state);

    // Start server
    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("WebSocket endpoint: ws://{}/api/sessions/{{id}}/ws", addr);
    tracing::info!("Health check: http://{}/health", addr);
    tracing::info!("Accepting frontend requests from {}", config.server.frontend_url);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Background task that periodically passes expired turns and removes finished sessions
async fn session_sweep_task(state: Arc<AppState>) {
    let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
    let turn_timeout = state.config.game.turn_timeout();
    let finished_ttl = state.config.game.finished_session_ttl();

    loop {
        interval.tick().await;

        let report = state
            .sessions
            .sweep(Instant::now(), turn_timeout, finished_ttl);

        if report.turns_expired > 0 || report.sessions_removed > 0 {
            tracing::debug!(
                "Session sweep: {} turns expired, {} sessions removed, {} live",
                report.turns_expired,
                report.sessions_removed,
                state.sessions.len()
            );
        }
    }
}

//! HTTP server module for the editor page, JSON API and WebSocket endpoint.

pub mod routes;
pub mod state;
pub mod ws;

use crate::config::ServerConfig;
use crate::server::routes::{health, page};
use crate::server::state::AppState;
use crate::server::ws::ws_handler;

use anyhow::Context;
use axum::{routing::get, Router};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Builds the application router.
pub fn router(state: Arc<AppState>) -> Router {
    // CORS layer for other frontends
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Editor page
        .route("/", get(page::index))
        // Health check
        .route("/health", get(health::health_check))
        // State API
        .route("/api/state", get(routes::state::get_state))
        // WebSocket
        .route("/ws", get(ws_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves on an already bound listener until `shutdown` resolves.
///
/// On shutdown every open WebSocket connection is closed.
pub async fn serve<F>(listener: TcpListener, state: Arc<AppState>, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = router(Arc::clone(&state));
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            let closed = state.engine.close_all();
            tracing::info!(closed, "Server shutting down");
        })
        .await
}

/// Binds the configured address and runs the server until `shutdown` resolves.
pub async fn run_server<F>(config: ServerConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = config.listen;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        slots = config.slot_count,
        "HTTP server listening"
    );

    let state = Arc::new(AppState::new(config));
    serve(listener, state, shutdown).await?;
    Ok(())
}

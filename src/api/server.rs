//! Axum server setup and startup

use std::net::SocketAddr;

use axum::{extract::State, routing::get, Json, Router};
use tower_http::cors::{Any, CorsLayer};

use super::shared::ServerStateHandle;
use super::types::StatusResponse;
use super::websocket::ws_handler;

/// Create the router with the tracking stream and status endpoints
pub fn create_router(state: ServerStateHandle) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/api/status", get(status_handler))
        .with_state(state)
}

/// Run the API server on the specified port with shared state
///
/// This function is intended to be run on a tokio runtime.
/// It will block until the server is shut down or the shutdown signal is received.
pub async fn run_server(
    port: u16,
    state: ServerStateHandle,
    mut shutdown_rx: tokio::sync::watch::Receiver<bool>,
) -> Result<(), std::io::Error> {
    // Enable CORS so browser frontends on other origins can connect
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state).layer(cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!("Gesture server listening on http://{}", addr);
    tracing::info!("WebSocket tracking stream at ws://{}/ws", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            // Wait for shutdown signal
            let _ = shutdown_rx.changed().await;
            tracing::info!("Gesture server shutting down gracefully");
        })
        .await
}

/// `GET /api/status`
async fn status_handler(State(state): State<ServerStateHandle>) -> Json<StatusResponse> {
    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        active_sessions: state.active_sessions(),
        snapshots_published: state.snapshots_published(),
        detector_ready: state.provider.is_ready(),
    })
}

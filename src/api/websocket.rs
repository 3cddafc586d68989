//! WebSocket handler for the tracking stream
//!
//! Each connected client gets its own [`TrackingSession`]: a private frame
//! source, private hand slots and a private publish gate. The capture loop
//! runs inside the connection task and yields between ticks so concurrent
//! sessions progress fairly.

use std::time::Instant;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};

use super::shared::ServerStateHandle;
use crate::gesture::TICK_YIELD;
use crate::session::{SessionEvent, TrackingSession};

/// WebSocket upgrade handler
///
/// Upgrades an HTTP connection to WebSocket and starts a tracking session.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<ServerStateHandle>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an individual WebSocket connection
async fn handle_socket(socket: WebSocket, state: ServerStateHandle) {
    tracing::info!("Tracking client connected");

    // Acquire a frame source for this session; released on every exit path
    // when the session (and its source) drops.
    let source = match state.sources.open() {
        Ok(source) => source,
        Err(e) => {
            tracing::error!("Failed to open frame source: {}", e);
            return;
        }
    };

    let _guard = state.session_started();
    let session = TrackingSession::new(source, state.provider.clone());

    let (sender, mut receiver) = socket.split();

    // Drain incoming messages so pings are answered and closes are seen.
    let recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => {
                    tracing::info!("Tracking client requested close");
                    break;
                }
                Ok(_) => {
                    // The stream is one-way; client payloads are ignored.
                }
                Err(e) => {
                    tracing::warn!("WebSocket receive error: {}", e);
                    break;
                }
            }
        }
    });

    // Capture loop: frame → detect → update slots → rate-gated publish.
    // Runs in this task so a client disconnect cancels it at the next await
    // and the session (with its frame source) drops right away.
    tokio::select! {
        _ = recv_task => {},
        _ = run_session(session, sender, &state) => {},
    }

    tracing::info!("Tracking client disconnected");
}

/// Drive one tracking session until its source ends or the client goes away.
async fn run_session(
    mut session: TrackingSession,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
    state: &ServerStateHandle,
) {
    loop {
        match session.poll_tick(Instant::now()) {
            SessionEvent::Publish(snapshot) => {
                let json = match serde_json::to_string(&snapshot) {
                    Ok(json) => json,
                    Err(e) => {
                        tracing::warn!("Failed to serialize snapshot: {}", e);
                        continue;
                    }
                };
                if sender.send(Message::Text(json)).await.is_err() {
                    // Client disconnected; send failures are not retried.
                    break;
                }
                state.add_published(1);
            }
            SessionEvent::Idle => {}
            SessionEvent::Ended => {
                tracing::info!("Frame source ended, closing session");
                break;
            }
        }

        // Cooperative yield so concurrent sessions share the runtime.
        tokio::time::sleep(TICK_YIELD).await;
    }

    let stats = session.tick_stats();
    tracing::info!(
        published = session.published(),
        avg_tick_ms = stats.avg_ms,
        ticks_per_second = session.ticks_per_second(),
        "Session finished"
    );
}

//! Gesture Server - Main Entry Point
//!
//! Headless tracking server: camera frames in, rate-limited hand gesture
//! snapshots out over WebSocket.

use std::sync::Arc;

use gesture_server::api::{run_server, ServerState};
use gesture_server::capture::CameraSourceFactory;
use gesture_server::landmark::OnnxLandmarkDetector;
use gesture_server::settings::ServerSettings;
use gesture_server::telemetry::{init_logging, LogConfig};

#[tokio::main]
async fn main() {
    // Load settings first so the configured log level applies
    let settings = ServerSettings::load();

    let log_config = LogConfig {
        console_enabled: true,
        file_enabled: false,
        file_path: None,
        json_format: false,
        default_level: settings.log_level.clone(),
    };
    // Keep the guard alive for the program duration
    let _log_guard = match init_logging(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            None
        }
    };

    tracing::info!("Gesture Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Camera {} at {}x{}, publishing on port {}",
        settings.camera_index,
        settings.capture_width,
        settings.capture_height,
        settings.api_port
    );

    // Landmark provider: constructed once, shared read-only by every session.
    let provider = Arc::new(OnnxLandmarkDetector::new(
        settings.model_dir().as_deref(),
    ));

    // Each connecting client acquires its own capture handle.
    let sources = Arc::new(CameraSourceFactory::new(
        settings.camera_index,
        settings.capture_width,
        settings.capture_height,
        settings.mirror_frames,
    ));

    let state = Arc::new(ServerState::new(provider, sources));

    // Ctrl-C flips the shutdown signal for a graceful exit.
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Ctrl-C received, shutting down");
            let _ = shutdown_tx.send(true);
        }
    });

    if let Err(e) = run_server(settings.api_port, state, shutdown_rx).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

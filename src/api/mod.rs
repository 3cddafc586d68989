//! WebSocket/REST surface of the gesture server
//!
//! Provides the `/ws` tracking stream and a small status endpoint.

pub mod server;
pub mod shared;
pub mod types;
pub mod websocket;

pub use server::run_server;
pub use shared::{ServerState, ServerStateHandle};
pub use types::StatusResponse;

//! API response types.
//!
//! The per-publish tracking message itself is [`crate::gesture::SessionSnapshot`]
//! serialized as `{"hands": [...]}`; only the REST status shape lives here.

use serde::Serialize;

/// Response for `GET /api/status`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    /// Server version
    pub version: String,
    /// Seconds since startup
    pub uptime_secs: u64,
    /// Currently connected tracking sessions
    pub active_sessions: usize,
    /// Snapshots published across all sessions since startup
    pub snapshots_published: u64,
    /// Whether the landmark model loaded
    pub detector_ready: bool,
}

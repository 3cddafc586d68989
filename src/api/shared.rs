//! State shared between API handlers
//!
//! Sessions own all of their mutable tracking state themselves; what lives
//! here is strictly the immutable wiring (the injected landmark provider,
//! the frame source factory) plus atomic counters for the status endpoint.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::capture::SourceFactory;
use crate::landmark::HandLandmarkProvider;

/// Shared server state accessible by API handlers.
pub struct ServerState {
    /// Landmark provider, constructed once and shared across sessions
    pub provider: Arc<dyn HandLandmarkProvider>,
    /// Opens a fresh frame source per connecting session
    pub sources: Arc<dyn SourceFactory>,
    /// Server start time (for uptime reporting)
    pub started_at: Instant,
    /// Currently connected tracking sessions
    active_sessions: AtomicUsize,
    /// Snapshots published across all sessions since startup
    snapshots_published: AtomicU64,
}

impl ServerState {
    pub fn new(provider: Arc<dyn HandLandmarkProvider>, sources: Arc<dyn SourceFactory>) -> Self {
        Self {
            provider,
            sources,
            started_at: Instant::now(),
            active_sessions: AtomicUsize::new(0),
            snapshots_published: AtomicU64::new(0),
        }
    }

    /// Register a newly connected session; returns a guard that
    /// unregisters it on drop (any exit path counts the session down).
    pub fn session_started(self: &Arc<Self>) -> SessionGuard {
        self.active_sessions.fetch_add(1, Ordering::Relaxed);
        SessionGuard {
            state: self.clone(),
        }
    }

    /// Current number of connected sessions.
    pub fn active_sessions(&self) -> usize {
        self.active_sessions.load(Ordering::Relaxed)
    }

    /// Add a session's published-snapshot count to the global total.
    pub fn add_published(&self, count: u64) {
        self.snapshots_published.fetch_add(count, Ordering::Relaxed);
    }

    /// Total snapshots published since startup.
    pub fn snapshots_published(&self) -> u64 {
        self.snapshots_published.load(Ordering::Relaxed)
    }
}

/// Counts a session down when it ends, however it ends.
pub struct SessionGuard {
    state: Arc<ServerState>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.state.active_sessions.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Type alias for the shared state handle used by API handlers
pub type ServerStateHandle = Arc<ServerState>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{CameraFrame, FrameSource};
    use crate::landmark::HandObservation;

    struct NullProvider;
    impl HandLandmarkProvider for NullProvider {
        fn detect(&self, _frame: &CameraFrame) -> Vec<HandObservation> {
            Vec::new()
        }
    }

    struct NullFactory;
    impl SourceFactory for NullFactory {
        fn open(&self) -> Result<Box<dyn FrameSource>, String> {
            Err("no device".to_string())
        }
    }

    fn state() -> ServerStateHandle {
        Arc::new(ServerState::new(Arc::new(NullProvider), Arc::new(NullFactory)))
    }

    #[test]
    fn test_session_guard_counts_down_on_drop() {
        let state = state();
        assert_eq!(state.active_sessions(), 0);
        {
            let _guard = state.session_started();
            assert_eq!(state.active_sessions(), 1);
            let _second = state.session_started();
            assert_eq!(state.active_sessions(), 2);
        }
        assert_eq!(state.active_sessions(), 0);
    }

    #[test]
    fn test_published_counter_accumulates() {
        let state = state();
        state.add_published(12);
        state.add_published(3);
        assert_eq!(state.snapshots_published(), 15);
    }
}

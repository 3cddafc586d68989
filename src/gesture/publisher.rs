//! Rate gate for outgoing snapshots.
//!
//! Newest-wins: a snapshot produced while the gate is closed is simply
//! dropped, never queued or replayed. This decouples (and caps) the outgoing
//! rate from the ingestion rate and doubles as the core's backpressure
//! mechanism: nothing accumulates behind a slow consumer.

use std::time::{Duration, Instant};

use super::PUBLISH_INTERVAL;

/// Decides, per tick, whether the freshly built snapshot goes out.
#[derive(Debug)]
pub struct SnapshotGate {
    last_send: Option<Instant>,
    interval: Duration,
}

impl Default for SnapshotGate {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotGate {
    /// Gate at the fixed publish interval (60 Hz cap).
    pub fn new() -> Self {
        Self::with_interval(PUBLISH_INTERVAL)
    }

    /// Gate at a custom interval (tests).
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            last_send: None,
            interval,
        }
    }

    /// True iff a send is due; records `now` as the send time when it is.
    ///
    /// The first call always passes (`last_send` starts as "never").
    pub fn should_send(&mut self, now: Instant) -> bool {
        let due = match self.last_send {
            Some(last) => now.duration_since(last) >= self.interval,
            None => true,
        };
        if due {
            self.last_send = Some(now);
        }
        due
    }
}

//! Gesture engine: smoothing, open-palm classification, grab-hold state
//! machine, per-session hand multiplexing and rate-limited publishing.
//!
//! Everything in this module is synchronous and owns no I/O; the session
//! loop feeds it observations and timestamps.

pub mod filter;
pub mod palm;
pub mod publisher;
pub mod slot;
pub mod tracker;

pub use filter::smooth;
pub use palm::{is_open_palm, palm_center};
pub use publisher::SnapshotGate;
pub use slot::{HandPayload, HandSlot};
pub use tracker::{HandTracker, SessionSnapshot};

use std::time::Duration;

/// EMA blend factor for all smoothed channels.
/// Lower = smoother with more lag, higher = more responsive with more jitter.
pub const SMOOTHING_ALPHA: f32 = 0.35;

/// Continuous open-palm time required to arm grab mode.
pub const GRAB_HOLD: Duration = Duration::from_secs(3);

/// Noise margin for the finger-extension test (squared-distance ratio).
pub const EXTENSION_RATIO: f32 = 1.08;

/// Minimum spacing between published snapshots (caps the outgoing rate at 60 Hz).
pub const PUBLISH_INTERVAL: Duration = Duration::from_micros(1_000_000 / 60);

/// Cooperative yield between capture ticks so concurrent sessions progress.
pub const TICK_YIELD: Duration = Duration::from_millis(10);

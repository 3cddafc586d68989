//! Gesture Server Library
//!
//! Turns per-frame hand-keypoint observations into a smoothed, gesture-aware
//! pointer/grab stream delivered over WebSocket at a capped rate. Capture,
//! landmark inference and transport are plumbing around the gesture core:
//! per-hand smoothing, open-palm classification, palm-hold grab arming and
//! rate-limited snapshot publishing.

pub mod api;
pub mod capture;
pub mod gesture;
pub mod landmark;
pub mod session;
pub mod settings;
pub mod telemetry;

pub use api::{run_server, ServerState, ServerStateHandle};
pub use capture::{CameraCapture, CameraFrame, CameraSourceFactory, FrameSource, SourceFactory};
pub use gesture::{HandPayload, HandSlot, HandTracker, SessionSnapshot, SnapshotGate};
pub use landmark::{HandLandmarkProvider, HandObservation, Handedness, Keypoint, OnnxLandmarkDetector};
pub use session::{SessionEvent, TrackingSession};
pub use settings::ServerSettings;

//! Per-connection tracking pipeline.
//!
//! One `TrackingSession` exists per connected consumer. It owns its frame
//! source, its two hand slots and its publish gate outright; nothing mutable
//! is shared with other sessions, so the whole tick is lock-free and
//! sequential. The async drive loop (sleep between ticks, socket sends)
//! lives in the WebSocket handler.

use std::sync::Arc;
use std::time::Instant;

use crate::capture::FrameSource;
use crate::gesture::{HandTracker, SessionSnapshot, SnapshotGate};
use crate::landmark::HandLandmarkProvider;
use crate::telemetry::{TickProfiler, TickStats};

/// Outcome of one capture tick.
#[derive(Debug)]
pub enum SessionEvent {
    /// A snapshot is due for transmission.
    Publish(SessionSnapshot),
    /// Nothing to send this tick (no new frame, or the rate gate held the
    /// snapshot back; held snapshots are dropped, never queued).
    Idle,
    /// The frame source is exhausted; the session is over.
    Ended,
}

/// Sequential per-connection pipeline: frame source → landmark provider →
/// hand tracker → publish gate.
pub struct TrackingSession {
    source: Box<dyn FrameSource>,
    provider: Arc<dyn HandLandmarkProvider>,
    tracker: HandTracker,
    gate: SnapshotGate,
    profiler: TickProfiler,
    published: u64,
}

impl TrackingSession {
    pub fn new(source: Box<dyn FrameSource>, provider: Arc<dyn HandLandmarkProvider>) -> Self {
        Self {
            source,
            provider,
            tracker: HandTracker::new(),
            gate: SnapshotGate::new(),
            profiler: TickProfiler::new(),
            published: 0,
        }
    }

    /// Advance the pipeline by one tick.
    ///
    /// Per-hand work runs synchronously in detection order (hand 0 before
    /// hand 1). The snapshot is built every processed frame but only
    /// released when the gate allows it.
    pub fn poll_tick(&mut self, now: Instant) -> SessionEvent {
        if !self.source.is_running() {
            return SessionEvent::Ended;
        }

        let Some(frame) = self.source.next_frame() else {
            return SessionEvent::Idle;
        };

        self.profiler.begin_tick();

        let observations = self.provider.detect(&frame);
        let snapshot = self.tracker.update(&observations, now);

        if self.gate.should_send(now) {
            self.published += 1;
            SessionEvent::Publish(snapshot)
        } else {
            SessionEvent::Idle
        }
    }

    /// Snapshots released for transmission so far.
    pub fn published(&self) -> u64 {
        self.published
    }

    /// Tick timing over the recent window.
    pub fn tick_stats(&self) -> TickStats {
        self.profiler.stats()
    }

    /// Processed-frame rate over the recent window.
    pub fn ticks_per_second(&self) -> f64 {
        self.profiler.ticks_per_second()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::CameraFrame;
    use crate::landmark::{
        HandObservation, Handedness, Keypoint, FINGER_JOINTS, KEYPOINT_COUNT, KNUCKLES, WRIST,
    };
    use parking_lot::Mutex;
    use std::time::Duration;

    /// Frame source producing one synthetic frame per call until exhausted.
    struct ScriptedSource {
        remaining: u32,
        counter: u64,
    }

    impl ScriptedSource {
        fn new(frames: u32) -> Self {
            Self {
                remaining: frames,
                counter: 0,
            }
        }
    }

    impl FrameSource for ScriptedSource {
        fn next_frame(&mut self) -> Option<CameraFrame> {
            if self.remaining == 0 {
                return None;
            }
            self.remaining -= 1;
            self.counter += 1;
            Some(CameraFrame {
                data: vec![0u8; 16],
                width: 2,
                height: 2,
                frame_number: self.counter,
                timestamp: Instant::now(),
            })
        }

        fn is_running(&self) -> bool {
            self.remaining > 0
        }
    }

    /// Provider returning a scripted sequence of observation lists.
    struct ScriptedProvider {
        script: Mutex<Vec<Vec<HandObservation>>>,
    }

    impl ScriptedProvider {
        fn new(mut script: Vec<Vec<HandObservation>>) -> Self {
            script.reverse();
            Self {
                script: Mutex::new(script),
            }
        }
    }

    impl HandLandmarkProvider for ScriptedProvider {
        fn detect(&self, _frame: &CameraFrame) -> Vec<HandObservation> {
            self.script.lock().pop().unwrap_or_default()
        }
    }

    fn open_hand(tip_x: f32) -> HandObservation {
        let mut points = [Keypoint::default(); KEYPOINT_COUNT];
        points[WRIST] = Keypoint { x: 0.5, y: 0.9, z: 0.0 };
        for &idx in &KNUCKLES {
            points[idx] = Keypoint { x: 0.5, y: 0.75, z: 0.0 };
        }
        for (finger, &(tip, mid)) in FINGER_JOINTS.iter().enumerate() {
            let x = 0.35 + finger as f32 * 0.1;
            points[mid] = Keypoint { x, y: 0.6, z: 0.0 };
            points[tip] = Keypoint { x, y: 0.3, z: 0.0 };
        }
        points[8].x = tip_x;
        HandObservation::new(points, Handedness::Right)
    }

    #[test]
    fn test_session_ends_when_source_exhausted() {
        let source = Box::new(ScriptedSource::new(0));
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let mut session = TrackingSession::new(source, provider);

        assert!(matches!(
            session.poll_tick(Instant::now()),
            SessionEvent::Ended
        ));
    }

    #[test]
    fn test_first_frame_publishes_raw_values() {
        let source = Box::new(ScriptedSource::new(2));
        let provider = Arc::new(ScriptedProvider::new(vec![
            vec![open_hand(0.5)],
            vec![open_hand(0.6)],
        ]));
        let mut session = TrackingSession::new(source, provider);
        let t0 = Instant::now();

        match session.poll_tick(t0) {
            SessionEvent::Publish(snap) => assert_eq!(snap.hands[0].x, 0.5),
            other => panic!("expected publish, got {:?}", other),
        }

        // Second frame a full interval later: smoothed value goes out.
        match session.poll_tick(t0 + Duration::from_millis(20)) {
            SessionEvent::Publish(snap) => {
                assert!((snap.hands[0].x - 0.535).abs() < 1e-6);
            }
            other => panic!("expected publish, got {:?}", other),
        }
        assert_eq!(session.published(), 2);
    }

    #[test]
    fn test_rate_gate_drops_intermediate_snapshots() {
        // 8 frames ticked 5ms apart against the ~16.7ms publish interval.
        let source = Box::new(ScriptedSource::new(8));
        let script = (0..8).map(|_| vec![open_hand(0.5)]).collect();
        let provider = Arc::new(ScriptedProvider::new(script));
        let mut session = TrackingSession::new(source, provider);

        let t0 = Instant::now();
        let mut published = 0;
        for i in 0..8u32 {
            if let SessionEvent::Publish(_) = session.poll_tick(t0 + Duration::from_millis(5) * i) {
                published += 1;
            }
        }

        // 35ms of ingestion at a 16.7ms interval: 3 sends (t=0, 20, 35).
        assert!(published <= 3, "published {} snapshots", published);
        assert_eq!(session.published(), published);
    }

    #[test]
    fn test_empty_snapshot_when_no_hands() {
        let source = Box::new(ScriptedSource::new(1));
        let provider = Arc::new(ScriptedProvider::new(vec![vec![]]));
        let mut session = TrackingSession::new(source, provider);

        match session.poll_tick(Instant::now()) {
            SessionEvent::Publish(snap) => assert!(snap.is_empty()),
            other => panic!("expected publish, got {:?}", other),
        }
    }
}

//! Session-level hand multiplexer.
//!
//! Each session owns exactly two hand slots. Observations are assigned to
//! slots by detection order: observation *i* goes to slot *i*. There is no
//! persistent hand identity, so if the provider reorders its detections
//! between ticks a slot silently receives a different physical hand. Known
//! limitation, kept deliberately.

use std::time::Instant;

use serde::Serialize;

use super::slot::{HandPayload, HandSlot};
use crate::landmark::HandObservation;

/// Number of hand slots per session.
pub const SLOT_COUNT: usize = 2;

/// One published aggregate of all currently tracked hands.
///
/// Ephemeral: built once per tick and discarded after (or instead of)
/// transmission. The wire shape is `{"hands": [...]}`.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SessionSnapshot {
    pub hands: Vec<HandPayload>,
}

impl SessionSnapshot {
    /// True when no hands are tracked this tick.
    pub fn is_empty(&self) -> bool {
        self.hands.is_empty()
    }
}

/// Per-session multiplexer owning the two hand slots.
#[derive(Debug, Default)]
pub struct HandTracker {
    slots: [HandSlot; SLOT_COUNT],
}

impl HandTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process one tick of observations.
    ///
    /// Slots with an observation are updated in detection order; slots
    /// without one are reset so a re-appearing hand starts unsmoothed.
    pub fn update(&mut self, observations: &[HandObservation], now: Instant) -> SessionSnapshot {
        let mut hands = Vec::with_capacity(SLOT_COUNT);

        for (index, slot) in self.slots.iter_mut().enumerate() {
            match observations.get(index) {
                Some(obs) => hands.push(slot.update(obs, index, now)),
                None => slot.reset(),
            }
        }

        SessionSnapshot { hands }
    }

    /// Number of slots currently tracking a hand.
    pub fn tracked_hands(&self) -> usize {
        self.slots.iter().filter(|s| s.is_tracking()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::{
        Handedness, Keypoint, FINGER_JOINTS, INDEX_TIP, KEYPOINT_COUNT, KNUCKLES, WRIST,
    };
    use std::time::Duration;

    fn open_hand(tip_x: f32, handedness: Handedness) -> HandObservation {
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
        points[INDEX_TIP].x = tip_x;
        HandObservation::new(points, handedness)
    }

    #[test]
    fn test_assignment_by_detection_order() {
        let mut tracker = HandTracker::new();
        let now = Instant::now();

        let snapshot = tracker.update(
            &[
                open_hand(0.2, Handedness::Left),
                open_hand(0.8, Handedness::Right),
            ],
            now,
        );

        assert_eq!(snapshot.hands.len(), 2);
        assert_eq!(snapshot.hands[0].hand, 0);
        assert_eq!(snapshot.hands[0].handedness, Handedness::Left);
        assert_eq!(snapshot.hands[1].hand, 1);
        assert_eq!(snapshot.hands[1].handedness, Handedness::Right);
    }

    #[test]
    fn test_vacated_slots_reset_each_tick() {
        let mut tracker = HandTracker::new();
        let t0 = Instant::now();

        tracker.update(
            &[
                open_hand(0.2, Handedness::Left),
                open_hand(0.8, Handedness::Right),
            ],
            t0,
        );
        assert_eq!(tracker.tracked_hands(), 2);

        let snap = tracker.update(
            &[open_hand(0.2, Handedness::Left)],
            t0 + Duration::from_millis(10),
        );
        assert_eq!(snap.hands.len(), 1);
        assert_eq!(tracker.tracked_hands(), 1);

        let snap = tracker.update(&[], t0 + Duration::from_millis(20));
        assert!(snap.is_empty());
        assert_eq!(tracker.tracked_hands(), 0);
    }

    #[test]
    fn test_reacquired_slot_starts_unsmoothed() {
        let mut tracker = HandTracker::new();
        let t0 = Instant::now();

        tracker.update(&[open_hand(0.2, Handedness::Left)], t0);
        tracker.update(&[], t0 + Duration::from_millis(10));

        // New hand in the reset slot: first sample equals raw input.
        let snap = tracker.update(
            &[open_hand(0.9, Handedness::Right)],
            t0 + Duration::from_millis(20),
        );
        assert_eq!(snap.hands[0].x, 0.9);
    }

    #[test]
    fn test_fingertip_smoothing_sequence() {
        let mut tracker = HandTracker::new();
        let t0 = Instant::now();

        let snap = tracker.update(&[open_hand(0.5, Handedness::Right)], t0);
        assert_eq!(snap.hands[0].x, 0.5);

        let snap = tracker.update(
            &[open_hand(0.6, Handedness::Right)],
            t0 + Duration::from_millis(10),
        );
        assert!((snap.hands[0].x - 0.535).abs() < 1e-6);
    }

    #[test]
    fn test_snapshot_wire_shape() {
        let mut tracker = HandTracker::new();
        let snap = tracker.update(&[open_hand(0.5, Handedness::Right)], Instant::now());

        let json = serde_json::to_value(&snap).unwrap();
        let hand = &json["hands"][0];
        for field in [
            "x",
            "y",
            "z",
            "pinch",
            "palm_x",
            "palm_y",
            "palm_z",
            "is_open_palm",
            "palm_hold_duration",
            "is_grabbing",
            "hand",
        ] {
            assert!(hand.get(field).is_some(), "missing field {}", field);
        }
        assert_eq!(hand["handedness"], "Right");
        assert_eq!(hand["hand"], 0);
    }
}

//! Per-hand slot state: smoothed channels plus the grab-hold state machine.

use std::time::Instant;

use serde::Serialize;

use super::{palm, smooth, GRAB_HOLD, SMOOTHING_ALPHA};
use crate::landmark::{HandObservation, Handedness, INDEX_TIP, THUMB_TIP};

/// Per-hand payload published in a session snapshot.
///
/// Field names are the wire contract; serialized as-is by the publisher.
#[derive(Clone, Debug, Serialize)]
pub struct HandPayload {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub pinch: f32,
    pub palm_x: f32,
    pub palm_y: f32,
    pub palm_z: f32,
    pub is_open_palm: bool,
    /// Continuous open-palm time so far, clamped to `[0, 3.0]` seconds.
    pub palm_hold_duration: f32,
    pub is_grabbing: bool,
    /// Slot index (0 or 1).
    pub hand: usize,
    pub handedness: Handedness,
}

/// Mutable per-hand state owned by one session slot.
///
/// The seven smoothed channels are either all uninitialized or all
/// initialized together: `update` writes every channel each tick, and
/// `reset` clears every field atomically. The first sample after a reset
/// passes through unsmoothed on every channel.
#[derive(Debug, Default)]
pub struct HandSlot {
    x: Option<f32>,
    y: Option<f32>,
    z: Option<f32>,
    pinch: Option<f32>,
    palm_x: Option<f32>,
    palm_y: Option<f32>,
    palm_z: Option<f32>,
    palm_hold_start: Option<Instant>,
    grabbing: bool,
}

impl HandSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the slot is currently tracking a hand.
    pub fn is_tracking(&self) -> bool {
        self.x.is_some()
    }

    /// Clear every field back to the untracked state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Feed one observation through smoothing and the grab state machine.
    ///
    /// The smoothed pointer and palm channels are recomputed every tick
    /// regardless of gesture state.
    pub fn update(&mut self, obs: &HandObservation, index: usize, now: Instant) -> HandPayload {
        let tip = obs.keypoints[INDEX_TIP];
        let raw_pinch = obs.keypoints[THUMB_TIP].dist(&obs.keypoints[INDEX_TIP]);
        let center = palm::palm_center(&obs.keypoints);

        let x = Self::blend(&mut self.x, tip.x);
        let y = Self::blend(&mut self.y, tip.y);
        let z = Self::blend(&mut self.z, tip.z);
        let pinch = Self::blend(&mut self.pinch, raw_pinch);
        let palm_x = Self::blend(&mut self.palm_x, center.x);
        let palm_y = Self::blend(&mut self.palm_y, center.y);
        let palm_z = Self::blend(&mut self.palm_z, center.z);

        let open = palm::is_open_palm(&obs.keypoints);
        if open {
            let start = *self.palm_hold_start.get_or_insert(now);
            if now.duration_since(start) >= GRAB_HOLD {
                self.grabbing = true;
            }
        } else {
            // A single closed reading fully disarms the timer; no grace period.
            self.palm_hold_start = None;
            self.grabbing = false;
        }

        let hold = self
            .palm_hold_start
            .map(|start| now.duration_since(start).as_secs_f32())
            .unwrap_or(0.0)
            .min(GRAB_HOLD.as_secs_f32());

        HandPayload {
            x,
            y,
            z,
            pinch,
            palm_x,
            palm_y,
            palm_z,
            is_open_palm: open,
            palm_hold_duration: hold,
            is_grabbing: self.grabbing,
            hand: index,
            handedness: obs.handedness,
        }
    }

    fn blend(channel: &mut Option<f32>, raw: f32) -> f32 {
        let value = smooth(*channel, raw, SMOOTHING_ALPHA);
        *channel = Some(value);
        value
    }
}

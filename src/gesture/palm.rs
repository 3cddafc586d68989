//! Open-palm classification and palm-center estimation.
//!
//! Both are pure functions over the 21-point skeleton. The palm center is
//! deliberately anchored on the wrist + knuckles rather than a fingertip:
//! it stays put while fingers flex, which is what a drag anchor needs. The
//! fingertip anchor is reserved for pointer/zoom interactions.

use super::EXTENSION_RATIO;
use crate::landmark::{Keypoint, FINGER_JOINTS, KEYPOINT_COUNT, KNUCKLES, WRIST};

/// Classify the hand as an open palm.
///
/// A finger counts as extended when its tip is farther from the wrist than
/// its PIP mid-joint by the [`EXTENSION_RATIO`] margin, or when the tip sits
/// above the mid-joint in image coordinates (y grows downward). All four
/// non-thumb fingers must be extended; the thumb is not evaluated.
pub fn is_open_palm(keypoints: &[Keypoint; KEYPOINT_COUNT]) -> bool {
    let wrist = &keypoints[WRIST];

    FINGER_JOINTS.iter().all(|&(tip, mid)| {
        let tip_dist = keypoints[tip].dist_sq(wrist);
        let mid_dist = keypoints[mid].dist_sq(wrist);
        tip_dist > EXTENSION_RATIO * mid_dist || keypoints[tip].y < keypoints[mid].y
    })
}

/// Estimate the palm center as the per-axis mean of the wrist and the four
/// MCP knuckles.
pub fn palm_center(keypoints: &[Keypoint; KEYPOINT_COUNT]) -> Keypoint {
    let mut center = keypoints[WRIST];
    for &idx in &KNUCKLES {
        center.x += keypoints[idx].x;
        center.y += keypoints[idx].y;
        center.z += keypoints[idx].z;
    }
    let n = (KNUCKLES.len() + 1) as f32;
    Keypoint {
        x: center.x / n,
        y: center.y / n,
        z: center.z / n,
    }
}

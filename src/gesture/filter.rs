//! Single-channel exponential moving average.
//!
//! Each pointer/palm channel is smoothed independently; a channel never
//! blends with another channel's history.

/// Blend a raw sample into a channel's smoothed history.
///
/// When `previous` is `None` (first sample after a slot reset) the raw value
/// passes through unchanged, so a newly tracked hand starts without
/// artificial lag.
pub fn smooth(previous: Option<f32>, raw: f32, alpha: f32) -> f32 {
    match previous {
        Some(prev) => alpha * raw + (1.0 - alpha) * prev,
        None => raw,
    }
}

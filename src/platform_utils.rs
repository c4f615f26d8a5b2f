//! Platform-agnostic utility functions
//!
//! Frame-rate helpers shared by the controller, the scheduler and the CLI.

use std::time::Duration;

use crate::config::capture::{MAX_FRAME_RATE, MIN_FRAME_RATE};
use crate::error::CaptureError;

/// Clamp a requested frame rate into the accepted range
///
/// Non-finite input falls back to the minimum rate.
pub fn clamp_frame_rate(rate: f64) -> f64 {
    if !rate.is_finite() {
        return MIN_FRAME_RATE;
    }
    rate.clamp(MIN_FRAME_RATE, MAX_FRAME_RATE)
}

/// Reject a frame rate outside [MIN_FRAME_RATE, MAX_FRAME_RATE]
///
/// # Returns
/// * `Ok(rate)` when the rate is usable as-is
/// * `Err(CaptureError::InvalidConfiguration)` otherwise
pub fn validate_frame_rate(rate: f64) -> Result<f64, CaptureError> {
    if rate.is_finite() && (MIN_FRAME_RATE..=MAX_FRAME_RATE).contains(&rate) {
        Ok(rate)
    } else {
        Err(CaptureError::invalid(format!(
            "frame rate {} outside [{}, {}]",
            rate, MIN_FRAME_RATE, MAX_FRAME_RATE
        )))
    }
}

/// Tick interval for a frame rate
///
/// The rate is clamped first, so the result is always between ~16.7ms and 1s.
pub fn frame_interval(rate: f64) -> Duration {
    Duration::from_secs_f64(1.0 / clamp_frame_rate(rate))
}

/// Two frame rates that schedule the same interval
pub fn same_rate(a: f64, b: f64) -> bool {
    (a - b).abs() < f64::EPSILON
}

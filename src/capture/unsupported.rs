// capture/unsupported.rs - Fallback for platforms without per-window capture
//
// The controller treats every failure as transient, so sessions keep ticking and
// reporting errors; they are never torn down by this backend.

use super::{CaptureFrame, SourceWindow, WindowCapturer};
use crate::error::CaptureError;

pub struct UnsupportedWindowCapturer;

impl WindowCapturer for UnsupportedWindowCapturer {
    fn capture(&self, window: &SourceWindow) -> Result<CaptureFrame, CaptureError> {
        Err(CaptureError::unavailable(format!(
            "window capture is not supported on {} (window {})",
            std::env::consts::OS,
            window.id
        )))
    }

    fn name(&self) -> &'static str {
        "unsupported"
    }
}

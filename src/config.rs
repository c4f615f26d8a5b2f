//! Application Configuration Constants
//!
//! Centralized configuration for frame rates, visibility thresholds and window
//! candidate limits. Runtime-adjustable values live in the binary's settings file;
//! everything here is fixed at compile time.

/// Capture cadence configuration
pub mod capture {
    /// Lowest frame rate a session accepts (frames per second)
    pub const MIN_FRAME_RATE: f64 = 1.0;

    /// Highest frame rate a session accepts (frames per second)
    pub const MAX_FRAME_RATE: f64 = 60.0;

    /// Rate the control panel starts with
    pub const DEFAULT_FRAME_RATE: f64 = 3.0;

    /// Rate used when a caller does not supply one
    pub const FALLBACK_FRAME_RATE: f64 = 30.0;

    /// Fixed rate while the display window is only partially visible
    pub const REDUCED_FRAME_RATE: f64 = 1.0;

    /// Log retention period in days
    pub const LOG_RETENTION_DAYS: u32 = 30;
}

/// Visibility classification thresholds
///
/// Both ratios are empirical tuning constants carried over unchanged for behavioral
/// compatibility. They are not derived from any invariant.
pub mod visibility {
    /// Ratios strictly above this are `FullyVisible`
    pub const FULLY_VISIBLE_RATIO: f64 = 0.30;

    /// Ratios strictly above this (and not above the full threshold) are `PartiallyVisible`
    pub const PARTIALLY_VISIBLE_RATIO: f64 = 0.05;

    /// How often a polling environment re-checks the display window (milliseconds)
    pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
}

/// Source window candidate limits
pub mod window {
    /// Candidates must be strictly wider than this (points)
    pub const MIN_CANDIDATE_WIDTH: f64 = 50.0;

    /// Candidates must be strictly taller than this (points)
    pub const MIN_CANDIDATE_HEIGHT: f64 = 50.0;

    /// Label used when a window reports no title
    pub const UNTITLED_WINDOW: &str = "Untitled Window";

    /// Label used when the owning application is unknown
    pub const UNKNOWN_APP: &str = "Unknown App";
}

/// Platform Feature Support
pub mod platform {
    /// Whether per-window capture is backed by a real implementation
    ///
    /// macOS: CGWindowListCreateImage for a single window id
    /// Other platforms: every capture reports `CaptureUnavailable`
    #[cfg(target_os = "macos")]
    pub const SUPPORTS_WINDOW_CAPTURE: bool = true;

    #[cfg(not(target_os = "macos"))]
    pub const SUPPORTS_WINDOW_CAPTURE: bool = false;
}

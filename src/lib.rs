//! GlassView - Window Mirroring Library
//!
//! This library provides the capture session controller and the platform pieces it
//! drives: per-window screenshots, window enumeration, and display-window visibility.

// Configuration constants
pub mod config;
pub mod error;

// Platform-agnostic utilities
pub mod platform_utils;

pub mod capture;
pub mod display_info;
pub mod platform;

// Source window filtering for pickers
pub mod window_filter;

// Capture session state machine and its runtime
pub mod controller;
pub mod environment;
pub mod events;
pub mod runtime;
pub mod scheduler;
pub mod visibility;

// Re-export commonly used types
pub use capture::{create_window_capturer, CaptureFrame, SourceWindow, WindowBounds, WindowCapturer};
pub use controller::{CaptureSessionController, CaptureSubscriber, ControllerOptions};
pub use environment::{EnvironmentEvent, EnvironmentSender, EnvironmentSource, PollingEnvironment};
pub use error::CaptureError;
pub use events::{ControllerEvent, SessionId, TickHandle};
pub use runtime::{CaptureHandle, CaptureRuntime, CaptureStatus};
pub use scheduler::{TickScheduler, TokioScheduler};
pub use visibility::{StaticTarget, TargetSnapshot, TargetWindow, Visibility};

#[cfg(target_os = "macos")]
pub use capture::MacOSWindowCapturer;

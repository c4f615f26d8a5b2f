// capture/mod.rs - Window Capture Module
//
// This module provides the per-window screenshot abstraction used by the capture
// session controller. Each platform has its own submodule with the actual capture call.

#[cfg(target_os = "macos")]
pub mod macos;
#[cfg(target_os = "macos")]
pub use macos::MacOSWindowCapturer;

#[cfg(not(target_os = "macos"))]
pub mod unsupported;
#[cfg(not(target_os = "macos"))]
pub use unsupported::UnsupportedWindowCapturer;

use serde::{Deserialize, Serialize};

use crate::error::CaptureError;

/// Window bounds in global screen points
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WindowBounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl WindowBounds {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Opaque handle to a window that can be mirrored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceWindow {
    /// Platform window identifier (CGWindowID on macOS)
    pub id: u32,
    /// Process that owns the window
    pub owner_pid: u32,
    /// Owning application's display name
    pub app_name: String,
    /// Window title; may be empty for utility windows
    pub title: String,
    pub bounds: WindowBounds,
    /// Whether the window list reported it as currently on screen
    pub on_screen: bool,
}

impl SourceWindow {
    /// "App - Title" label shown in window pickers
    pub fn display_title(&self) -> String {
        let app = if self.app_name.is_empty() {
            crate::config::window::UNKNOWN_APP
        } else {
            &self.app_name
        };
        let title = if self.title.is_empty() {
            crate::config::window::UNTITLED_WINDOW
        } else {
            &self.title
        };
        format!("{} - {}", app, title)
    }
}

/// A captured frame containing pixel data
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureFrame {
    /// RGBA8 pixel data (premultiplied alpha)
    pub data: Vec<u8>,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Bytes per row (may include padding)
    pub stride: u32,
    /// Window the frame was taken from
    pub window_id: u32,
}

impl CaptureFrame {
    /// Build a tightly packed RGBA8 frame
    pub fn from_rgba(window_id: u32, width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            data,
            width,
            height,
            stride: width * 4,
            window_id,
        }
    }
}

/// Trait for platform-specific window capturers
///
/// `capture` may block; the scheduler runs it off the controller's thread and
/// marshals the result back.
pub trait WindowCapturer: Send + Sync {
    /// Take one screenshot of `window`
    fn capture(&self, window: &SourceWindow) -> Result<CaptureFrame, CaptureError>;

    /// Short backend name for logs
    fn name(&self) -> &'static str;
}

/// Create the platform-specific window capturer
pub fn create_window_capturer() -> anyhow::Result<Box<dyn WindowCapturer>> {
    #[cfg(target_os = "macos")]
    {
        Ok(Box::new(macos::MacOSWindowCapturer::new()?))
    }

    #[cfg(not(target_os = "macos"))]
    {
        Ok(Box::new(unsupported::UnsupportedWindowCapturer))
    }
}

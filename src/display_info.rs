//! Display Information Manager
//!
//! Caches the active screen's size so visibility checks do not query the window
//! server for it on every poll.
//!
//! # Platform Support
//!
//! ## macOS
//! Uses the main CGDisplay: bounds in points, pixel dimensions for the scale factor.
//!
//! ## Other platforms
//! No display query is implemented; `initialize` reports an error and the cached
//! info stays at its zero default, which classifies every display window as hidden.
//!
//! # Usage
//!
//! ```rust
//! # use glassview_capture::display_info;
//! // Initialize once at startup; refresh after display configuration changes
//! display_info::initialize().ok();
//!
//! let info = display_info::get();
//! println!("Screen: {}x{} pt", info.width_points, info.height_points);
//! ```

use lazy_static::lazy_static;
use log::info;
use std::sync::RwLock;

lazy_static! {
    /// Global display information slot
    static ref DISPLAY_INFO: RwLock<DisplayInfo> = RwLock::new(DisplayInfo::default());
}

/// Display information for the active screen
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayInfo {
    /// Backing scale factor (2.0 for Retina, 1.0 for standard)
    pub scale_factor: f64,
    /// Screen width in points
    pub width_points: f64,
    /// Screen height in points
    pub height_points: f64,
    /// Screen width in pixels
    pub width_pixels: u32,
    /// Screen height in pixels
    pub height_pixels: u32,
    /// Whether display info has been initialized
    pub initialized: bool,
}

impl Default for DisplayInfo {
    fn default() -> Self {
        Self {
            scale_factor: 1.0,
            width_points: 0.0,
            height_points: 0.0,
            width_pixels: 0,
            height_pixels: 0,
            initialized: false,
        }
    }
}

impl DisplayInfo {
    /// Build from point bounds and pixel dimensions
    pub fn from_dimensions(
        width_points: f64,
        height_points: f64,
        width_pixels: u32,
        height_pixels: u32,
    ) -> Self {
        let scale_factor = if width_points > 0.0 {
            width_pixels as f64 / width_points
        } else {
            1.0
        };
        Self {
            scale_factor,
            width_points,
            height_points,
            width_pixels,
            height_pixels,
            initialized: true,
        }
    }

    /// Screen area in square points
    pub fn area_points(&self) -> f64 {
        self.width_points * self.height_points
    }

    /// Convert points to pixels
    pub fn points_to_pixels(&self, points: f64) -> i32 {
        (points * self.scale_factor).round() as i32
    }
}

/// Query the platform and store the result
pub fn initialize() -> anyhow::Result<()> {
    let info = query_display()?;
    info!(
        "Display: {}x{} pt, {}x{} px, scale {}",
        info.width_points, info.height_points, info.width_pixels, info.height_pixels, info.scale_factor
    );
    set(info);
    Ok(())
}

/// Current cached info (zero default until initialized)
pub fn get() -> DisplayInfo {
    DISPLAY_INFO
        .read()
        .map(|info| info.clone())
        .unwrap_or_default()
}

pub fn is_initialized() -> bool {
    get().initialized
}

/// Replace the cached info (display change notifications, tests)
pub fn set(info: DisplayInfo) {
    if let Ok(mut slot) = DISPLAY_INFO.write() {
        *slot = info;
    }
}

#[cfg(target_os = "macos")]
fn query_display() -> anyhow::Result<DisplayInfo> {
    use core_graphics::display::CGDisplay;

    let display = CGDisplay::main();
    let bounds = display.bounds();
    if bounds.size.width <= 0.0 || bounds.size.height <= 0.0 {
        anyhow::bail!("main display reported empty bounds");
    }
    Ok(DisplayInfo::from_dimensions(
        bounds.size.width,
        bounds.size.height,
        display.pixels_wide() as u32,
        display.pixels_high() as u32,
    ))
}

#[cfg(not(target_os = "macos"))]
fn query_display() -> anyhow::Result<DisplayInfo> {
    anyhow::bail!("display query is not implemented on {}", std::env::consts::OS)
}

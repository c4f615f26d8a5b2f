//! Display window backed by a platform window id
//!
//! Hosts that own a real on-screen window hand its id to `PlatformTargetWindow` and
//! register it with the controller. Each snapshot re-reads the window server; the
//! screen size comes from the cached `display_info`.

use crate::display_info::{self, DisplayInfo};
use crate::platform::window_enumerator::WindowListEntry;
use crate::visibility::{TargetSnapshot, TargetWindow};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformTargetWindow {
    window_id: u32,
}

impl PlatformTargetWindow {
    pub fn new(window_id: u32) -> Self {
        if !display_info::is_initialized() {
            if let Err(e) = display_info::initialize() {
                log::warn!("Display size unavailable, target will read as hidden: {}", e);
            }
        }
        Self { window_id }
    }

    pub fn window_id(&self) -> u32 {
        self.window_id
    }
}

/// Build a snapshot from one window-list entry
///
/// The window server reports a single on-screen flag: it is false both for windows
/// on another space and for minimized windows, so it feeds both visibility inputs.
pub fn snapshot_from_entry(entry: &WindowListEntry, display: &DisplayInfo) -> TargetSnapshot {
    let on_screen = entry.on_screen.unwrap_or(false);
    TargetSnapshot {
        occlusion_visible: on_screen,
        on_active_space: on_screen,
        width: entry.bounds.width,
        height: entry.bounds.height,
        screen_width: display.width_points,
        screen_height: display.height_points,
    }
}

impl TargetWindow for PlatformTargetWindow {
    #[cfg(target_os = "macos")]
    fn snapshot(&self) -> Option<TargetSnapshot> {
        let entry = crate::platform::window_enumerator::macos::lookup_entry(self.window_id)?;
        Some(snapshot_from_entry(&entry, &display_info::get()))
    }

    #[cfg(not(target_os = "macos"))]
    fn snapshot(&self) -> Option<TargetSnapshot> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::WindowBounds;
    use crate::visibility::{classify, Visibility};

    fn display() -> DisplayInfo {
        DisplayInfo::from_dimensions(1000.0, 1000.0, 2000, 2000)
    }

    fn entry(width: f64, height: f64, on_screen: Option<bool>) -> WindowListEntry {
        WindowListEntry {
            number: 12,
            owner_pid: 77,
            bounds: WindowBounds::new(0.0, 0.0, width, height),
            on_screen,
            ..Default::default()
        }
    }

    #[test]
    fn large_on_screen_window_is_fully_visible() {
        let snapshot = snapshot_from_entry(&entry(800.0, 600.0, Some(true)), &display());
        assert!((snapshot.visible_ratio() - 0.48).abs() < 1e-9);
        assert_eq!(classify(&snapshot), Visibility::FullyVisible);
    }

    #[test]
    fn off_screen_window_is_hidden() {
        let snapshot = snapshot_from_entry(&entry(800.0, 600.0, Some(false)), &display());
        assert!(!snapshot.occlusion_visible);
        assert_eq!(classify(&snapshot), Visibility::Hidden);

        let unknown = snapshot_from_entry(&entry(800.0, 600.0, None), &display());
        assert_eq!(classify(&unknown), Visibility::Hidden);
    }

    #[test]
    fn unknown_screen_size_reads_as_hidden() {
        let snapshot = snapshot_from_entry(&entry(800.0, 600.0, Some(true)), &DisplayInfo::default());
        assert_eq!(classify(&snapshot), Visibility::Hidden);
    }
}

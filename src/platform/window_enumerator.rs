//! Cross-platform window enumeration facade
//!
//! Lists the windows a user could pick as a mirror source. Candidate filtering (own
//! windows, tiny windows, untitled windows) happens in `window_filter`; this layer
//! only drops what the window server itself marks as non-capturable.

use crate::capture::{SourceWindow, WindowBounds};

/// Contract every platform must implement to list capture sources
pub trait WindowEnumerator {
    /// Enumerate on-screen windows in front-to-back order
    fn enumerate_windows() -> anyhow::Result<Vec<SourceWindow>>;

    /// Look up a single window by id, on screen or not
    fn find_window(id: u32) -> anyhow::Result<Option<SourceWindow>>;
}

/// Platform-dispatched enumeration entrypoint
pub fn enumerate_windows() -> anyhow::Result<Vec<SourceWindow>> {
    PlatformWindowEnumerator::enumerate_windows()
}

/// Platform-dispatched single window lookup
pub fn find_window(id: u32) -> anyhow::Result<Option<SourceWindow>> {
    PlatformWindowEnumerator::find_window(id)
}

/// Sharing state the window server reports for windows that refuse capture
pub const SHARING_STATE_NONE: i64 = 0;

/// One raw entry of a platform window list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowListEntry {
    pub number: i64,
    pub layer: i64,
    pub name: Option<String>,
    pub owner_pid: i64,
    pub owner_name: Option<String>,
    pub sharing_state: Option<i64>,
    pub bounds: WindowBounds,
    pub on_screen: Option<bool>,
}

impl WindowListEntry {
    /// Convert to a `SourceWindow`, or `None` for entries that can never be mirrored
    ///
    /// Kept entries are normal-layer windows with a valid id and owner whose sharing
    /// state is not "none". A missing sharing state counts as shareable.
    pub fn into_source_window(self) -> Option<SourceWindow> {
        if self.number <= 0 || self.number > u32::MAX as i64 {
            return None;
        }
        if self.layer != 0 {
            return None;
        }
        if self.owner_pid <= 0 || self.owner_pid > u32::MAX as i64 {
            return None;
        }
        if self.sharing_state == Some(SHARING_STATE_NONE) {
            return None;
        }

        Some(SourceWindow {
            id: self.number as u32,
            owner_pid: self.owner_pid as u32,
            app_name: self.owner_name.unwrap_or_default(),
            title: self.name.unwrap_or_default(),
            bounds: self.bounds,
            on_screen: self.on_screen.unwrap_or(false),
        })
    }
}

// --- macOS implementation -------------------------------------------------

#[cfg(target_os = "macos")]
pub(crate) mod macos {
    use super::{SourceWindow, WindowBounds, WindowEnumerator, WindowListEntry};
    use anyhow::Result;
    use core_foundation::array::{CFArray, CFArrayRef};
    use core_foundation::base::TCFType;
    use core_foundation::boolean::CFBoolean;
    use core_foundation::dictionary::CFDictionary;
    use core_foundation::number::CFNumber;
    use core_foundation::string::CFString;

    extern "C" {
        fn CGWindowListCopyWindowInfo(option: u32, relativeToWindow: u32) -> CFArrayRef;
    }

    const KCG_WINDOW_LIST_OPTION_ON_SCREEN_ONLY: u32 = 1 << 0;
    const KCG_WINDOW_LIST_OPTION_INCLUDING_WINDOW: u32 = 1 << 3;
    const KCG_WINDOW_LIST_EXCLUDE_DESKTOP_ELEMENTS: u32 = 1 << 4;
    const KCG_NULL_WINDOW_ID: u32 = 0;

    pub struct PlatformWindowEnumerator;

    impl WindowEnumerator for PlatformWindowEnumerator {
        fn enumerate_windows() -> Result<Vec<SourceWindow>> {
            let entries = copy_window_list(
                KCG_WINDOW_LIST_OPTION_ON_SCREEN_ONLY | KCG_WINDOW_LIST_EXCLUDE_DESKTOP_ELEMENTS,
                KCG_NULL_WINDOW_ID,
            );
            log::debug!("[WinEnum] CGWindowList returned {} windows", entries.len());

            let windows: Vec<SourceWindow> = entries
                .into_iter()
                .filter_map(|entry| {
                    // The on-screen-only list omits the flag for some windows
                    let entry = WindowListEntry {
                        on_screen: Some(entry.on_screen.unwrap_or(true)),
                        ..entry
                    };
                    entry.into_source_window()
                })
                .collect();

            log::debug!("[WinEnum] Kept {} capturable windows", windows.len());
            Ok(windows)
        }

        fn find_window(id: u32) -> Result<Option<SourceWindow>> {
            Ok(lookup_entry(id).and_then(WindowListEntry::into_source_window))
        }
    }

    /// Raw CG entry for one window id, including windows on other spaces
    pub(crate) fn lookup_entry(id: u32) -> Option<WindowListEntry> {
        if id == KCG_NULL_WINDOW_ID {
            return None;
        }
        copy_window_list(KCG_WINDOW_LIST_OPTION_INCLUDING_WINDOW, id)
            .into_iter()
            .find(|entry| entry.number == id as i64)
    }

    fn copy_window_list(options: u32, relative_to: u32) -> Vec<WindowListEntry> {
        unsafe {
            let window_list_ref = CGWindowListCopyWindowInfo(options, relative_to);
            if window_list_ref.is_null() {
                return Vec::new();
            }

            let window_list = CFArray::<CFDictionary>::wrap_under_create_rule(window_list_ref);
            let mut entries = Vec::with_capacity(window_list.len() as usize);
            for i in 0..window_list.len() {
                let Some(dict) = window_list.get(i) else {
                    continue;
                };
                entries.push(read_entry(&dict));
            }
            entries
        }
    }

    fn read_entry(dict: &CFDictionary) -> WindowListEntry {
        let bounds = dictionary(dict, "kCGWindowBounds")
            .map(|b| {
                WindowBounds::new(
                    float(&b, "X").unwrap_or(0.0),
                    float(&b, "Y").unwrap_or(0.0),
                    float(&b, "Width").unwrap_or(0.0),
                    float(&b, "Height").unwrap_or(0.0),
                )
            })
            .unwrap_or_default();

        WindowListEntry {
            number: integer(dict, "kCGWindowNumber").unwrap_or(0),
            layer: integer(dict, "kCGWindowLayer").unwrap_or(0),
            name: string(dict, "kCGWindowName"),
            owner_pid: integer(dict, "kCGWindowOwnerPID").unwrap_or(0),
            owner_name: string(dict, "kCGWindowOwnerName"),
            sharing_state: integer(dict, "kCGWindowSharingState"),
            bounds,
            on_screen: boolean(dict, "kCGWindowIsOnscreen"),
        }
    }

    fn integer(dict: &CFDictionary, key: &'static str) -> Option<i64> {
        let key = CFString::from_static_string(key);
        dict.find(key.as_CFTypeRef() as *const _).and_then(|val_ref| {
            let cf_num = unsafe { CFNumber::wrap_under_get_rule(val_ref.cast()) };
            cf_num.to_i64()
        })
    }

    fn float(dict: &CFDictionary, key: &'static str) -> Option<f64> {
        let key = CFString::from_static_string(key);
        dict.find(key.as_CFTypeRef() as *const _).and_then(|val_ref| {
            let cf_num = unsafe { CFNumber::wrap_under_get_rule(val_ref.cast()) };
            cf_num.to_f64()
        })
    }

    fn string(dict: &CFDictionary, key: &'static str) -> Option<String> {
        let key = CFString::from_static_string(key);
        dict.find(key.as_CFTypeRef() as *const _).map(|val_ref| {
            let cf_str = unsafe { CFString::wrap_under_get_rule(val_ref.cast()) };
            cf_str.to_string()
        })
    }

    fn boolean(dict: &CFDictionary, key: &'static str) -> Option<bool> {
        let key = CFString::from_static_string(key);
        dict.find(key.as_CFTypeRef() as *const _).map(|val_ref| {
            let cf_bool = unsafe { CFBoolean::wrap_under_get_rule(val_ref.cast()) };
            bool::from(cf_bool)
        })
    }

    fn dictionary(dict: &CFDictionary, key: &'static str) -> Option<CFDictionary> {
        let key = CFString::from_static_string(key);
        dict.find(key.as_CFTypeRef() as *const _)
            .map(|val_ref| unsafe { CFDictionary::wrap_under_get_rule(val_ref.cast()) })
    }
}

#[cfg(target_os = "macos")]
use macos::PlatformWindowEnumerator;

// --- Fallback for platforms without a window list ------------------------

#[cfg(not(target_os = "macos"))]
mod unsupported_impl {
    use super::{SourceWindow, WindowEnumerator};
    use anyhow::Result;

    pub struct PlatformWindowEnumerator;

    impl WindowEnumerator for PlatformWindowEnumerator {
        fn enumerate_windows() -> Result<Vec<SourceWindow>> {
            log::info!(
                "[WinEnum] Window enumeration not available on {} - returning empty list",
                std::env::consts::OS
            );
            Ok(Vec::new())
        }

        fn find_window(_id: u32) -> Result<Option<SourceWindow>> {
            Ok(None)
        }
    }
}

#[cfg(not(target_os = "macos"))]
use unsupported_impl::PlatformWindowEnumerator;

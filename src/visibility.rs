//! Display window visibility classification
//!
//! The display (target) window gates capture: a session runs at the requested rate
//! while the window covers a large share of the active screen, drops to the reduced
//! rate while it covers a small share, and pauses when it is hidden, occluded or on
//! another virtual desktop.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::config::visibility::{FULLY_VISIBLE_RATIO, PARTIALLY_VISIBLE_RATIO};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Visibility {
    Hidden,
    PartiallyVisible,
    FullyVisible,
}

impl Visibility {
    pub fn is_hidden(self) -> bool {
        self == Visibility::Hidden
    }
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = match self {
            Visibility::Hidden => "Hidden",
            Visibility::PartiallyVisible => "PartiallyVisible",
            Visibility::FullyVisible => "FullyVisible",
        };
        write!(f, "{}", value)
    }
}

/// Point-in-time state of the display window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetSnapshot {
    /// At least minimally visible (not fully occluded, not minimized)
    pub occlusion_visible: bool,
    /// Member of the currently active virtual desktop
    pub on_active_space: bool,
    /// Window size in points
    pub width: f64,
    pub height: f64,
    /// Size of the screen the window is on, in points
    pub screen_width: f64,
    pub screen_height: f64,
}

impl TargetSnapshot {
    /// Window area relative to screen area; 0.0 when the screen size is unknown
    pub fn visible_ratio(&self) -> f64 {
        let screen_area = self.screen_width * self.screen_height;
        if screen_area.is_nan() || screen_area <= 0.0 {
            return 0.0;
        }
        (self.width.max(0.0) * self.height.max(0.0)) / screen_area
    }
}

/// The local window whose visibility gates capture
///
/// The controller holds it weakly. `None` from `snapshot` means the window is gone
/// or cannot be queried right now; both classify as `Hidden`.
pub trait TargetWindow: Send + Sync {
    fn snapshot(&self) -> Option<TargetSnapshot>;
}

/// Classify by area ratio against the fixed thresholds
///
/// `> 0.30` is `FullyVisible`, `(0.05, 0.30]` is `PartiallyVisible`, anything at or
/// below `0.05` is `Hidden`.
pub fn classify_ratio(ratio: f64) -> Visibility {
    if ratio > FULLY_VISIBLE_RATIO {
        Visibility::FullyVisible
    } else if ratio > PARTIALLY_VISIBLE_RATIO {
        Visibility::PartiallyVisible
    } else {
        Visibility::Hidden
    }
}

/// Full classification rule for a snapshot
pub fn classify(snapshot: &TargetSnapshot) -> Visibility {
    if !snapshot.occlusion_visible || !snapshot.on_active_space {
        return Visibility::Hidden;
    }
    classify_ratio(snapshot.visible_ratio())
}

/// A display window whose state is set explicitly
///
/// Used by headless runs (nothing on screen to query) and by tests.
#[derive(Debug)]
pub struct StaticTarget {
    state: Mutex<Option<TargetSnapshot>>,
}

impl StaticTarget {
    pub fn new(snapshot: TargetSnapshot) -> Self {
        Self {
            state: Mutex::new(Some(snapshot)),
        }
    }

    /// Visible, on the active space, with the given area ratio on a 1000x1000 screen
    pub fn with_ratio(ratio: f64) -> Self {
        Self::new(Self::ratio_snapshot(ratio))
    }

    /// Covers the whole screen
    pub fn fully_visible() -> Self {
        Self::with_ratio(1.0)
    }

    pub fn set(&self, snapshot: TargetSnapshot) {
        if let Ok(mut state) = self.state.lock() {
            *state = Some(snapshot);
        }
    }

    pub fn set_ratio(&self, ratio: f64) {
        self.set(Self::ratio_snapshot(ratio));
    }

    pub fn set_occlusion_visible(&self, visible: bool) {
        self.update(|s| s.occlusion_visible = visible);
    }

    pub fn set_on_active_space(&self, on_active_space: bool) {
        self.update(|s| s.on_active_space = on_active_space);
    }

    /// Make the window unqueryable (closed)
    pub fn clear(&self) {
        if let Ok(mut state) = self.state.lock() {
            *state = None;
        }
    }

    fn update(&self, f: impl FnOnce(&mut TargetSnapshot)) {
        if let Ok(mut state) = self.state.lock() {
            if let Some(snapshot) = state.as_mut() {
                f(snapshot);
            }
        }
    }

    fn ratio_snapshot(ratio: f64) -> TargetSnapshot {
        TargetSnapshot {
            occlusion_visible: true,
            on_active_space: true,
            width: 1000.0 * ratio.max(0.0),
            height: 1000.0,
            screen_width: 1000.0,
            screen_height: 1000.0,
        }
    }
}

impl TargetWindow for StaticTarget {
    fn snapshot(&self) -> Option<TargetSnapshot> {
        self.state.lock().ok().and_then(|state| *state)
    }
}

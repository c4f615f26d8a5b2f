//! Platform-agnostic source window filtering
//!
//! Decides which enumerated windows are offered as mirror sources. Keeps out:
//! - The host application's own windows (mirroring the mirror)
//! - Untitled utility windows and windows too small to be worth mirroring
//! - Windows the user excluded by application or title
//!
//! The capture controller does not consult this filter; it only validates that a
//! source is capturable. Filtering is a host concern applied to picker lists.

use serde::{Deserialize, Serialize};

use crate::capture::SourceWindow;
use crate::config::window::{MIN_CANDIDATE_HEIGHT, MIN_CANDIDATE_WIDTH};

/// Identifies windows across application restarts by app name and title
///
/// An empty field matches anything, so `app_all_windows("Safari")` matches every
/// Safari window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct WindowIdentifier {
    /// Owning application's display name (e.g., "Google Chrome")
    pub app_name: String,

    /// Window title for disambiguation
    pub window_name: String,
}

impl WindowIdentifier {
    pub fn new(app_name: String, window_name: String) -> Self {
        Self {
            app_name,
            window_name,
        }
    }

    /// Example: WindowIdentifier::app_window("Google Chrome", "Gmail")
    pub fn app_window(app_name: &str, window_name: &str) -> Self {
        Self::new(app_name.to_string(), window_name.to_string())
    }

    /// Example: WindowIdentifier::app_all_windows("Safari")
    pub fn app_all_windows(app_name: &str) -> Self {
        Self::new(app_name.to_string(), String::new())
    }

    /// Cross-app match by title only
    pub fn window_by_name(window_name: &str) -> Self {
        Self::new(String::new(), window_name.to_string())
    }

    pub fn of(window: &SourceWindow) -> Self {
        Self::new(window.app_name.clone(), window.title.clone())
    }

    pub fn matches(&self, window: &SourceWindow) -> bool {
        if self.app_name.is_empty() && self.window_name.is_empty() {
            return false;
        }
        let app_ok = self.app_name.is_empty() || self.app_name == window.app_name;
        let title_ok = self.window_name.is_empty() || self.window_name == window.title;
        app_ok && title_ok
    }
}

/// The application presenting the picker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostIdentity {
    pub pid: u32,
    pub app_name: String,
}

impl HostIdentity {
    pub fn new(pid: u32, app_name: impl Into<String>) -> Self {
        Self {
            pid,
            app_name: app_name.into(),
        }
    }

    /// The running process, identified by pid only
    pub fn current() -> Self {
        Self::new(std::process::id(), String::new())
    }

    fn owns(&self, window: &SourceWindow) -> bool {
        window.owner_pid == self.pid
            || (!self.app_name.is_empty() && window.app_name == self.app_name)
    }
}

/// Settings for source window filtering
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowFilterSettings {
    /// Windows must be strictly wider than this (points)
    pub min_width: f64,

    /// Windows must be strictly taller than this (points)
    pub min_height: f64,

    /// Offer windows with an empty title
    pub include_untitled: bool,

    /// Windows never offered as sources
    pub excluded_windows: Vec<WindowIdentifier>,

    /// Developer mode: offer the host's own windows too
    /// Set via environment variable: GLASSVIEW_DEV_MODE=1
    #[serde(skip)]
    pub dev_mode: bool,
}

impl Default for WindowFilterSettings {
    fn default() -> Self {
        Self {
            min_width: MIN_CANDIDATE_WIDTH,
            min_height: MIN_CANDIDATE_HEIGHT,
            include_untitled: false,
            excluded_windows: Vec::new(),
            dev_mode: dev_mode_from_env(),
        }
    }
}

/// `GLASSVIEW_DEV_MODE` is on for "1", "true" or "yes"
fn dev_mode_from_env() -> bool {
    std::env::var("GLASSVIEW_DEV_MODE")
        .map(|value| parse_dev_mode(&value))
        .unwrap_or(false)
}

fn parse_dev_mode(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes"
    )
}

impl WindowFilterSettings {
    /// Check if a window should appear in the source picker
    pub fn should_offer(&self, window: &SourceWindow, host: &HostIdentity) -> bool {
        if !self.dev_mode && host.owns(window) {
            return false;
        }
        if !self.include_untitled && window.title.trim().is_empty() {
            return false;
        }
        if window.bounds.width <= self.min_width || window.bounds.height <= self.min_height {
            return false;
        }
        !self.excluded_windows.iter().any(|id| id.matches(window))
    }

    /// Keep only offerable windows, preserving order
    pub fn filter_candidates(
        &self,
        windows: impl IntoIterator<Item = SourceWindow>,
        host: &HostIdentity,
    ) -> Vec<SourceWindow> {
        windows
            .into_iter()
            .filter(|w| self.should_offer(w, host))
            .collect()
    }

    pub fn add_exclusion(&mut self, window: WindowIdentifier) {
        if !self.excluded_windows.contains(&window) {
            self.excluded_windows.push(window);
        }
    }

    pub fn remove_exclusion(&mut self, window: &WindowIdentifier) {
        self.excluded_windows.retain(|w| w != window);
    }

    /// Exclude every window of an application
    pub fn exclude_app(&mut self, app_name: &str) {
        self.add_exclusion(WindowIdentifier::app_all_windows(app_name));
    }

    pub fn exclude_app_window(&mut self, app_name: &str, window_name: &str) {
        self.add_exclusion(WindowIdentifier::app_window(app_name, window_name));
    }

    pub fn clear_exclusions(&mut self) {
        self.excluded_windows.clear();
    }

    pub fn exclusion_count(&self) -> usize {
        self.excluded_windows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::WindowBounds;

    fn settings() -> WindowFilterSettings {
        WindowFilterSettings {
            dev_mode: false,
            ..Default::default()
        }
    }

    fn window(pid: u32, app: &str, title: &str, width: f64, height: f64) -> SourceWindow {
        SourceWindow {
            id: pid * 10,
            owner_pid: pid,
            app_name: app.to_string(),
            title: title.to_string(),
            bounds: WindowBounds::new(0.0, 0.0, width, height),
            on_screen: true,
        }
    }

    #[test]
    fn own_windows_are_not_offered() {
        let host = HostIdentity::new(100, "GlassView");
        let own = window(100, "GlassView", "Mirror", 800.0, 600.0);
        let same_app_other_pid = window(101, "GlassView", "Helper", 800.0, 600.0);

        assert!(!settings().should_offer(&own, &host));
        assert!(!settings().should_offer(&same_app_other_pid, &host));
    }

    #[test]
    fn dev_mode_offers_own_windows() {
        let host = HostIdentity::new(100, "GlassView");
        let own = window(100, "GlassView", "Mirror", 800.0, 600.0);
        let dev = WindowFilterSettings {
            dev_mode: true,
            ..settings()
        };
        assert!(dev.should_offer(&own, &host));
    }

    #[test]
    fn dev_mode_needs_an_affirmative_value() {
        assert!(parse_dev_mode("1"));
        assert!(parse_dev_mode(" TRUE "));
        assert!(parse_dev_mode("yes"));
        assert!(!parse_dev_mode("0"));
        assert!(!parse_dev_mode("false"));
        assert!(!parse_dev_mode(""));
    }

    #[test]
    fn size_threshold_is_strict() {
        let host = HostIdentity::new(1, "");
        assert!(!settings().should_offer(&window(2, "Notes", "a", 50.0, 400.0), &host));
        assert!(!settings().should_offer(&window(2, "Notes", "a", 400.0, 50.0), &host));
        assert!(settings().should_offer(&window(2, "Notes", "a", 51.0, 51.0), &host));
    }

    #[test]
    fn untitled_windows_need_opt_in() {
        let host = HostIdentity::new(1, "");
        let untitled = window(2, "Finder", "  ", 400.0, 400.0);
        assert!(!settings().should_offer(&untitled, &host));

        let permissive = WindowFilterSettings {
            include_untitled: true,
            ..settings()
        };
        assert!(permissive.should_offer(&untitled, &host));
    }

    #[test]
    fn exclusions_match_by_app_or_title() {
        let host = HostIdentity::new(1, "");
        let mut filter = settings();
        filter.exclude_app("Slack");
        filter.add_exclusion(WindowIdentifier::window_by_name("Inspector"));

        assert!(!filter.should_offer(&window(2, "Slack", "general", 400.0, 400.0), &host));
        assert!(!filter.should_offer(&window(3, "Safari", "Inspector", 400.0, 400.0), &host));
        assert!(filter.should_offer(&window(3, "Safari", "Docs", 400.0, 400.0), &host));
    }

    #[test]
    fn empty_identifier_matches_nothing() {
        let id = WindowIdentifier::new(String::new(), String::new());
        assert!(!id.matches(&window(2, "Slack", "general", 400.0, 400.0)));
    }

    #[test]
    fn filter_preserves_order() {
        let host = HostIdentity::new(1, "GlassView");
        let windows = vec![
            window(3, "Mail", "Inbox", 900.0, 700.0),
            window(1, "GlassView", "Mirror", 900.0, 700.0),
            window(4, "Music", "", 900.0, 700.0),
            window(5, "Maps", "Tokyo", 900.0, 700.0),
        ];
        let kept: Vec<u32> = settings()
            .filter_candidates(windows, &host)
            .iter()
            .map(|w| w.owner_pid)
            .collect();
        assert_eq!(kept, vec![3, 5]);
    }
}

use serde::{Deserialize, Serialize};

use glassview_capture::config;
use glassview_capture::platform_utils::clamp_frame_rate;
use glassview_capture::window_filter::{WindowFilterSettings, WindowIdentifier};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    // Capture
    #[serde(default = "default_frame_rate")]
    pub frame_rate: f64,
    /// How often the CLI re-checks the display window when one is given (ms)
    #[serde(default = "default_visibility_poll_ms")]
    pub visibility_poll_ms: u64,

    // Source picking
    #[serde(default)]
    pub window_filter: WindowFilterSettings,

    // Window Memory
    #[serde(default = "default_remember_last_window")]
    pub remember_last_window: bool,
    /// Window ids do not survive restarts, so the last source is remembered by
    /// app name and title.
    #[serde(default)]
    pub last_window: Option<WindowIdentifier>,

    // Logging
    #[serde(default = "default_log_level")]
    pub log_level: String, // "Off", "Error", "Warn", "Info", "Debug", "Trace"
    #[serde(default = "default_log_to_file")]
    pub log_to_file: bool,
    #[serde(default = "default_log_retention_days")]
    pub log_retention_days: u32,
}

// Default functions for serde
fn default_frame_rate() -> f64 {
    config::capture::DEFAULT_FRAME_RATE
}

fn default_visibility_poll_ms() -> u64 {
    config::visibility::DEFAULT_POLL_INTERVAL_MS
}

fn default_remember_last_window() -> bool {
    true
}

fn default_log_level() -> String {
    "Error".to_string() // Default: only errors
}

fn default_log_to_file() -> bool {
    true
}

fn default_log_retention_days() -> u32 {
    config::capture::LOG_RETENTION_DAYS
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            frame_rate: default_frame_rate(),
            visibility_poll_ms: default_visibility_poll_ms(),
            window_filter: WindowFilterSettings::default(),
            remember_last_window: default_remember_last_window(),
            last_window: None,
            log_level: default_log_level(),
            log_to_file: default_log_to_file(),
            log_retention_days: default_log_retention_days(),
        }
    }
}

impl Settings {
    /// Frame rate to start with, clamped into the accepted range
    ///
    /// The command line value wins over the stored one.
    pub fn effective_frame_rate(&self, requested: Option<f64>) -> f64 {
        clamp_frame_rate(requested.unwrap_or(self.frame_rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_frame_rate_matches_control_panel() {
        let settings = Settings::default();
        assert_eq!(settings.frame_rate, 3.0);
        assert!(settings.last_window.is_none());
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let settings: Settings = serde_json::from_str(r#"{ "frame_rate": 12.0 }"#).unwrap();
        assert_eq!(settings.frame_rate, 12.0);
        assert_eq!(settings.log_level, "Error");
        assert!(settings.remember_last_window);
    }

    #[test]
    fn command_line_rate_wins() {
        let settings = Settings::default();
        assert_eq!(settings.effective_frame_rate(Some(24.0)), 24.0);
        assert_eq!(settings.effective_frame_rate(None), 3.0);
    }

    #[test]
    fn out_of_range_rate_is_clamped() {
        let settings = Settings::default();
        assert_eq!(settings.effective_frame_rate(Some(120.0)), 60.0);
        assert_eq!(settings.effective_frame_rate(Some(0.2)), 1.0);
        assert!(glassview_capture::platform_utils::validate_frame_rate(
            settings.effective_frame_rate(Some(120.0))
        )
        .is_ok());

        let stored = Settings {
            frame_rate: 500.0,
            ..Settings::default()
        };
        assert_eq!(stored.effective_frame_rate(None), 60.0);
    }
}

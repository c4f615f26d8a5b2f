use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::settings::Settings;
use glassview_capture::config;
use glassview_capture::platform_utils::clamp_frame_rate;

const SETTINGS_FILE: &str = "settings.json";

pub fn glassview_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("GlassView"))
}

fn merge_json(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_obj), Value::Object(overlay_obj)) => {
            for (k, v) in overlay_obj {
                match base_obj.get_mut(&k) {
                    Some(existing) => merge_json(existing, v),
                    None => {
                        base_obj.insert(k, v);
                    }
                }
            }
        }
        (base_slot, overlay_value) => {
            *base_slot = overlay_value;
        }
    }
}

/// Bring hand-edited or legacy settings into the current schema
///
/// - frame_rate: numeric strings parsed, out-of-range values clamped to [1, 60]
/// - visibility_poll_ms: zero or missing values reset to the default
/// - log_level: lowercase names capitalized ("debug" -> "Debug")
/// - window_filter.excluded_apps: legacy list of app names -> excluded_windows
pub fn sanitize_settings_json(value: &mut Value) {
    let Value::Object(obj) = value else {
        return;
    };

    let frame_rate = match obj.get("frame_rate") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match frame_rate {
        Some(rate) if rate.is_finite() => {
            obj.insert(
                "frame_rate".to_string(),
                serde_json::json!(clamp_frame_rate(rate)),
            );
        }
        _ => {
            obj.remove("frame_rate");
        }
    }

    if obj.get("visibility_poll_ms").and_then(|v| v.as_u64()) == Some(0) {
        obj.insert(
            "visibility_poll_ms".to_string(),
            serde_json::json!(config::visibility::DEFAULT_POLL_INTERVAL_MS),
        );
    }

    if let Some(level) = obj.get("log_level").and_then(|v| v.as_str()) {
        let lower = level.trim().to_lowercase();
        let normalized = match lower.as_str() {
            "warning" => "Warn".to_string(),
            other => {
                let mut chars = other.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => "Error".to_string(),
                }
            }
        };
        obj.insert("log_level".to_string(), Value::String(normalized));
    }

    if let Some(window_filter) = obj.get_mut("window_filter").and_then(|v| v.as_object_mut()) {
        if let Some(Value::Array(apps)) = window_filter.remove("excluded_apps") {
            let mut excluded = match window_filter.remove("excluded_windows") {
                Some(Value::Array(existing)) => existing,
                _ => Vec::new(),
            };
            for app in apps.into_iter().filter_map(|a| a.as_str().map(str::to_string)) {
                let entry = serde_json::json!({ "app_name": app, "window_name": "" });
                if !excluded.contains(&entry) {
                    excluded.push(entry);
                }
            }
            window_filter.insert("excluded_windows".to_string(), Value::Array(excluded));
        }
    }
}

/// Settings read at startup, plus problems found before logging is up
#[derive(Debug)]
pub struct LoadedSettings {
    pub settings: Settings,
    pub warnings: Vec<String>,
}

/// Load settings from `dir`, merging onto defaults and rewriting a normalized file
pub fn load_settings_from_disk(dir: &Path) -> LoadedSettings {
    let mut warnings = Vec::new();
    let _ = std::fs::create_dir_all(dir);
    let settings_path = dir.join(SETTINGS_FILE);

    let raw = std::fs::read_to_string(&settings_path).unwrap_or_else(|_| "{}".to_string());
    let mut value: Value = serde_json::from_str(&raw).unwrap_or_else(|e| {
        warnings.push(format!("Ignoring unreadable {:?}: {}", settings_path, e));
        serde_json::json!({})
    });

    sanitize_settings_json(&mut value);

    // Merge onto current defaults so missing keys don't break deserialization.
    let mut merged =
        serde_json::to_value(Settings::default()).unwrap_or_else(|_| serde_json::json!({}));
    merge_json(&mut merged, value);

    let settings: Settings = serde_json::from_value(merged).unwrap_or_else(|e| {
        warnings.push(format!("Settings did not match the schema, using defaults: {}", e));
        Settings::default()
    });

    // Ensure there is always a normalized, fully-populated settings.json on disk.
    if let Err(e) = persist_settings_to_dir(dir, &settings) {
        warnings.push(format!("Failed to persist normalized settings: {:#}", e));
    }

    LoadedSettings { settings, warnings }
}

/// Write `settings` into `dir`, keeping keys this version does not know about
pub fn persist_settings_to_dir(dir: &Path, settings: &Settings) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create config directory: {:?}", dir))?;
    let settings_path = dir.join(SETTINGS_FILE);

    let mut existing_value: Value = match std::fs::read_to_string(&settings_path) {
        Ok(s) => serde_json::from_str(&s).unwrap_or_else(|_| serde_json::json!({})),
        Err(_) => serde_json::json!({}),
    };
    if !existing_value.is_object() {
        existing_value = serde_json::json!({});
    }

    let new_value = serde_json::to_value(settings).context("Failed to serialize settings")?;
    merge_json(&mut existing_value, new_value);

    let pretty = serde_json::to_string_pretty(&existing_value)?;
    std::fs::write(&settings_path, pretty)
        .with_context(|| format!("Failed to write {:?}", settings_path))?;
    Ok(())
}

pub fn persist_settings_to_disk(settings: &Settings) -> Result<()> {
    let dir = glassview_config_dir().context("Could not find config directory")?;
    persist_settings_to_dir(&dir, settings)
}

use anyhow::{bail, Context, Result};

use glassview_capture::capture::SourceWindow;
use glassview_capture::platform::{enumerate_windows, find_window};
use glassview_capture::window_filter::{HostIdentity, WindowIdentifier};

use crate::cli::ListArgs;
use crate::settings::Settings;

/// Enumerated windows the picker would offer
pub fn candidate_windows(settings: &Settings) -> Result<Vec<SourceWindow>> {
    let windows = enumerate_windows().context("Failed to enumerate windows")?;
    let total = windows.len();
    let candidates = settings
        .window_filter
        .filter_candidates(windows, &HostIdentity::current());
    tracing::debug!(total, offered = candidates.len(), "Filtered source windows");
    Ok(candidates)
}

pub fn list_windows(settings: &Settings, args: &ListArgs) -> Result<()> {
    let windows = if args.all {
        enumerate_windows().context("Failed to enumerate windows")?
    } else {
        candidate_windows(settings)?
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&windows)?);
        return Ok(());
    }

    if windows.is_empty() {
        println!("No windows available to mirror");
        return Ok(());
    }
    for window in &windows {
        println!("{}", format_row(window));
    }
    Ok(())
}

fn format_row(window: &SourceWindow) -> String {
    format!(
        "{:>8}  {:>5}x{:<5}  {}",
        window.id,
        window.bounds.width.round() as i64,
        window.bounds.height.round() as i64,
        window.display_title()
    )
}

/// First candidate matching a remembered identifier
pub fn pick_remembered(
    candidates: Vec<SourceWindow>,
    remembered: &WindowIdentifier,
) -> Option<SourceWindow> {
    candidates.into_iter().find(|w| remembered.matches(w))
}

/// The window to mirror: an explicit id, or the remembered one
pub fn resolve_window(id: Option<u32>, settings: &Settings) -> Result<SourceWindow> {
    if let Some(id) = id {
        return match find_window(id)? {
            Some(window) => Ok(window),
            None => bail!("No window with id {} (run `glassview list`)", id),
        };
    }

    let remembered = match (&settings.last_window, settings.remember_last_window) {
        (Some(remembered), true) => remembered,
        _ => bail!("No --window given and no remembered window"),
    };
    match pick_remembered(candidate_windows(settings)?, remembered) {
        Some(window) => {
            tracing::info!(window = %window.display_title(), "Using remembered window");
            Ok(window)
        }
        None => bail!(
            "Remembered window \"{} - {}\" is not open",
            remembered.app_name,
            remembered.window_name
        ),
    }
}

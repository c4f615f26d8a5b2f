use crate::cli::Cli;
use crate::settings::Settings;
use crate::settings_io::LoadedSettings;
use crate::{logging, settings_io};
use glassview_capture::{config, display_info};

/// Load settings early to get log level configuration.
///
/// Warnings are held until `report_settings_warnings` runs with logging installed.
pub(crate) fn load_initial_settings() -> LoadedSettings {
    match settings_io::glassview_config_dir() {
        Some(dir) => settings_io::load_settings_from_disk(&dir),
        None => LoadedSettings {
            settings: Settings::default(),
            warnings: vec!["No config directory available, using default settings".to_string()],
        },
    }
}

/// Surface settings problems through tracing, or stderr when logging is down
pub(crate) fn report_settings_warnings(warnings: &[String], logging_ready: bool) {
    for warning in warnings {
        if logging_ready {
            tracing::warn!("{}", warning);
        } else {
            eprintln!("Warning: {}", warning);
        }
    }
}

/// Log level for this run: command line first, then settings
pub(crate) fn resolve_log_level(settings: &Settings, cli: &Cli) -> logging::LogLevel {
    let from_cli = cli.log_level.as_deref().and_then(|raw| match raw.parse() {
        Ok(level) => Some(level),
        Err(e) => {
            eprintln!("Warning: {}, using configured level", e);
            None
        }
    });
    from_cli.unwrap_or_else(|| {
        settings
            .log_level
            .parse::<logging::LogLevel>()
            .unwrap_or(logging::LogLevel::Error)
    })
}

/// Initialize logging system. Returns false when no subscriber could be installed.
pub(crate) fn init_logging(settings: &Settings, cli: &Cli) -> bool {
    let log_level = resolve_log_level(settings, cli);
    let log_to_file = settings.log_to_file && !cli.no_log_file;

    if let Err(e) = logging::init_logging(log_level, log_to_file) {
        eprintln!("Failed to initialize logging: {}", e);
        return false;
    }

    tracing::info!("***********************************************************************");
    tracing::info!("*                        GLASSVIEW STARTUP                            *");
    tracing::info!("***********************************************************************");
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        platform = std::env::consts::OS,
        log_level = %log_level,
        window_capture = config::platform::SUPPORTS_WINDOW_CAPTURE,
        "Application started"
    );
    tracing::debug!(
        os = std::env::consts::OS,
        arch = std::env::consts::ARCH,
        "Platform details"
    );

    if log_to_file {
        logging::auto_cleanup_old_logs(settings.log_retention_days);
    }
    true
}

/// Cache the active screen size used for visibility ratios.
pub(crate) fn init_display_info() {
    if display_info::is_initialized() {
        return;
    }

    match display_info::initialize() {
        Ok(()) => {
            let display_config = display_info::get();
            tracing::debug!(
                scale_factor = display_config.scale_factor,
                width_points = display_config.width_points,
                height_points = display_config.height_points,
                width_pixels = display_config.width_pixels,
                height_pixels = display_config.height_pixels,
                "Display details"
            );
        }
        Err(e) => tracing::warn!(error = %e, "Failed to initialize display info"),
    }
}

/// Log panics through tracing before the default hook runs.
pub(crate) fn install_panic_hook() {
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        tracing::error!(?panic_info, "Application panic detected");
        default_panic(panic_info);
    }));
}

/// Log active settings for debugging.
pub(crate) fn log_active_settings(settings: &Settings) {
    tracing::debug!(
        frame_rate = settings.frame_rate,
        visibility_poll_ms = settings.visibility_poll_ms,
        min_width = settings.window_filter.min_width,
        min_height = settings.window_filter.min_height,
        excluded_windows = settings.window_filter.exclusion_count(),
        remember_last_window = settings.remember_last_window,
        last_window = ?settings.last_window,
        log_level = ?settings.log_level,
        log_to_file = settings.log_to_file,
        log_retention_days = settings.log_retention_days,
        "Settings configuration"
    );
}

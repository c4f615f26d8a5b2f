use clap::Parser;

mod app_bootstrap;
mod cli;
mod commands;
mod logging;
mod settings;
mod settings_io;

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // Settings first so logging can honor the configured level
    let loaded = app_bootstrap::load_initial_settings();
    let mut settings = loaded.settings;
    let logging_ready = app_bootstrap::init_logging(&settings, &cli);
    app_bootstrap::report_settings_warnings(&loaded.warnings, logging_ready);
    app_bootstrap::install_panic_hook();
    app_bootstrap::init_display_info();
    app_bootstrap::log_active_settings(&settings);

    let result = commands::run(cli.command, &mut settings).await;
    if let Err(e) = &result {
        tracing::error!(error = %e, "Command failed");
    }
    result
}

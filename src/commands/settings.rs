use anyhow::Result;

use crate::settings::Settings;
use crate::{logging, settings_io};

pub fn print_settings(settings: &Settings) -> Result<()> {
    match settings_io::glassview_config_dir() {
        Some(dir) => println!("Settings: {}", dir.join("settings.json").display()),
        None => println!("Settings: <no config directory>"),
    }
    match logging::get_logs_dir() {
        Ok(dir) => println!("Logs:     {}", dir.display()),
        Err(e) => println!("Logs:     <unavailable: {}>", e),
    }
    println!("{}", serde_json::to_string_pretty(settings)?);
    Ok(())
}

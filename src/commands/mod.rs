pub mod mirror;
pub mod settings;
pub mod windows;

use anyhow::Result;

use crate::cli::Command;
use crate::settings::Settings;

pub async fn run(command: Command, settings: &mut Settings) -> Result<()> {
    match command {
        Command::List(args) => windows::list_windows(settings, &args),
        Command::Mirror(args) => mirror::run_mirror(settings, &args).await,
        Command::Settings => settings::print_settings(settings),
    }
}

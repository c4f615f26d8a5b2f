use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "glassview")]
#[command(version)]
#[command(about = "Mirror another application's window at a controlled frame rate", long_about = None)]
pub struct Cli {
    /// Override the configured log level (off, error, warn, info, debug, trace)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Do not write a log file for this run
    #[arg(long, global = true, action)]
    pub no_log_file: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List windows that can be mirrored
    List(ListArgs),
    /// Capture a window until interrupted or a frame count is reached
    Mirror(MirrorArgs),
    /// Print the settings file location and its effective contents
    Settings,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Print JSON instead of a table
    #[arg(long, action)]
    pub json: bool,

    /// Include windows the picker would normally hide
    #[arg(long, action)]
    pub all: bool,
}

#[derive(Args, Debug)]
pub struct MirrorArgs {
    /// Source window id (see `list`); defaults to the remembered window
    #[arg(short, long)]
    pub window: Option<u32>,

    /// Requested frames per second, 1 to 60
    #[arg(short, long)]
    pub fps: Option<f64>,

    /// Window id of the display window whose visibility gates capture
    #[arg(short, long)]
    pub target: Option<u32>,

    /// Stop after this many frames
    #[arg(short = 'n', long)]
    pub frames: Option<u64>,

    /// Do not remember this window and rate in the settings file
    #[arg(long, action)]
    pub no_remember: bool,
}

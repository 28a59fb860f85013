//! Command-line interface definition.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "voxlate")]
#[command(about = "Live speech translation pipeline")]
#[command(version)]
pub struct Cli {
    /// Path to the configuration file (defaults to
    /// ~/.config/voxlate/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print the resolved configuration as TOML and exit
    #[arg(long)]
    pub show_config: bool,

    /// Print the default configuration file path and exit
    #[arg(long)]
    pub config_path: bool,

    /// Suppress recoverable-error reporting
    #[arg(short, long)]
    pub quiet: bool,

    /// Increase logging verbosity (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// How long to run the demo pipeline, in seconds
    #[arg(long, default_value_t = 10)]
    pub duration: u64,

    /// Start with capture paused until resumed
    #[arg(long)]
    pub paused: bool,

    /// Source language code override
    #[arg(long)]
    pub source_lang: Option<String>,

    /// Target language code override
    #[arg(long)]
    pub target_lang: Option<String>,

    /// Disable transcript file output
    #[arg(long)]
    pub no_transcript: bool,
}

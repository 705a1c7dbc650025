//! speedramp CLI — compile editing scripts into ffmpeg renders.
//!
//! Usage:
//!   speedramp compile [SCRIPT]     Write the helper scripts and print ffmpeg arguments
//!   speedramp segments [SCRIPT]    Show the normalized speed segments
//!   speedramp check                Check for ffmpeg and ffprobe
//!
//! The script is read from stdin when no path is given.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use speedramp_common::config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "speedramp",
    about = "Retime footage with speed ramps and render it with ffmpeg",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Play footage outside speed overrides this many times faster
    #[arg(long, global = true)]
    default_speed_up: Option<f64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write sound and overlay scripts and print the ffmpeg arguments
    Compile {
        /// Editing script (stdin when omitted)
        script: Option<PathBuf>,

        /// Directory for the generated scripts
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Show the normalized speed segments of a script
    Segments {
        /// Editing script (stdin when omitted)
        script: Option<PathBuf>,

        /// Print the time map as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that the external tools are installed
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load();
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    speedramp_common::logging::init_logging(&config.logging);

    if let Some(factor) = cli.default_speed_up {
        if !(factor.is_finite() && factor > 0.0) {
            anyhow::bail!("--default-speed-up must be a positive number, got {factor}");
        }
        config.timeline.default_speed = 1.0 / factor;
    }
    config.validate()?;

    match cli.command {
        Commands::Compile { script, output } => commands::compile::run(script, output, config).await,
        Commands::Segments { script, json } => commands::segments::run(script, json, config).await,
        Commands::Check => commands::check::run(&config),
    }
}

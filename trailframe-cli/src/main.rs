//! Trailframe CLI - command-line interface
//!
//! Turns ride GPS tracks into per-frame map overlays matched to the videos
//! recorded along the way.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use commands::config::ConfigCommands;
use commands::plan::PlanArgs;
use commands::render::RenderArgs;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "trailframe", version, about = "GPS tracks to per-frame map overlays")]
struct Cli {
    /// Configuration file (default: <config dir>/trailframe/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Merge per-part video descriptors into one descriptor per recording
    ComputeSegments {
        /// Video info document ({"video_info": [...], "gpx_info": [...]})
        video_info: PathBuf,

        /// Output segments document
        output: PathBuf,

        /// Camera GPS logs, one per video part, replacing gpx_info
        #[arg(long, num_args = 1..)]
        gpx: Vec<PathBuf>,
    },

    /// Load tracks and print the encoding ranges
    Plan(PlanArgs),

    /// Download every tile the render will need
    Prefetch {
        /// Ride GPX files, loaded in path order
        #[arg(long, required = true, num_args = 1..)]
        gpx: Vec<PathBuf>,
    },

    /// Encode the frame sequence of every planned file
    Render(RenderArgs),

    /// Print the timecode schedule of each video
    Timecode {
        /// Segments or video info document
        video_info: PathBuf,
    },

    /// Manage the configuration file
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    let result: Result<(), CliError> = match cli.command {
        Commands::ComputeSegments {
            video_info,
            output,
            gpx,
        } => commands::segments::run(config_path, &video_info, &output, &gpx),
        Commands::Plan(args) => commands::plan::run(config_path, args),
        Commands::Prefetch { gpx } => commands::prefetch::run(config_path, &gpx),
        Commands::Render(args) => commands::render::run(config_path, args),
        Commands::Timecode { video_info } => commands::timecode::run(&video_info),
        Commands::Config(command) => commands::config::run(config_path, command),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

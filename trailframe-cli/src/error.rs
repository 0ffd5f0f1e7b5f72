//! CLI error type.

use std::fmt;

use trailframe::config::ConfigError;
use trailframe::render::RenderError;
use trailframe::tile::TileError;
use trailframe::track::TrackError;
use trailframe::video::VideoError;

/// Errors reported by CLI commands. Every variant exits with status 1.
#[derive(Debug)]
pub enum CliError {
    /// Configuration problem or unusable command-line arguments.
    Config(String),
    /// Logging could not be set up.
    Logging(String),
    /// No track data could be loaded from the given files.
    NoTrackData,
    Track(TrackError),
    Tile(TileError),
    Video(VideoError),
    Render(RenderError),
    /// Some output files were not produced.
    Failed { failed: usize, total: usize },
    /// Interrupted by Ctrl+C.
    Cancelled,
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Logging(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::NoTrackData => write!(f, "No track data could be loaded"),
            CliError::Track(e) => write!(f, "Track error: {}", e),
            CliError::Tile(e) => write!(f, "Tile error: {}", e),
            CliError::Video(e) => write!(f, "Video error: {}", e),
            CliError::Render(e) => write!(f, "Render error: {}", e),
            CliError::Failed { failed, total } => {
                write!(f, "{} of {} output files failed", failed, total)
            }
            CliError::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<TrackError> for CliError {
    fn from(e: TrackError) -> Self {
        CliError::Track(e)
    }
}

impl From<TileError> for CliError {
    fn from(e: TileError) -> Self {
        CliError::Tile(e)
    }
}

impl From<VideoError> for CliError {
    fn from(e: VideoError) -> Self {
        CliError::Video(e)
    }
}

impl From<RenderError> for CliError {
    fn from(e: RenderError) -> Self {
        match e {
            RenderError::Cancelled => CliError::Cancelled,
            other => CliError::Render(other),
        }
    }
}

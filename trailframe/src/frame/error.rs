//! Frame sequencing errors.

use thiserror::Error;

/// Errors raised while configuring zoom switching.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FrameError {
    /// A map switcher needs at least one zoom level.
    #[error("no zoom levels configured")]
    NoZoomLevels,

    /// Every zoom level must be shown for at least one second.
    #[error("zoom level {zoom} has a zero duration")]
    ZeroDuration { zoom: u8 },

    /// A map handed to a switcher has a zero duration.
    #[error("map {index} has a zero duration")]
    ZeroDurationMap { index: usize },

    /// A `zoom:seconds` list could not be parsed.
    #[error("invalid zoom level '{entry}': {reason}")]
    InvalidLevel { entry: String, reason: String },

    /// Frames per second must be positive.
    #[error("invalid frame rate {0}")]
    InvalidFps(f64),
}

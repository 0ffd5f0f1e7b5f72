//! Track loading and processing errors.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or resampling tracks.
#[derive(Debug, Error)]
pub enum TrackError {
    /// The track file could not be opened.
    #[error("failed to open {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The track file is not valid GPX.
    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// A point lacks its timestamp.
    #[error("{}: point {index} has no time", path.display())]
    MissingTime { path: PathBuf, index: usize },

    /// The file parsed but holds no points.
    #[error("{} contains no track points", path.display())]
    Empty { path: PathBuf },

    /// Two consecutive points share a timestamp, so the gap between them
    /// cannot be resampled.
    #[error("point {index} and its successor share timestamp {timestamp}")]
    DuplicateTimestamp { index: usize, timestamp: f64 },

    /// Resampling frequency must be positive and finite.
    #[error("invalid interpolation frequency {0}")]
    InvalidFrequency(f64),
}

//! Tile cache errors.

use std::path::PathBuf;

use thiserror::Error;

use crate::coord::{CoordError, TileKey};

/// Errors raised while fetching, storing or decoding tiles.
///
/// Cloneable so that one failure can be reported to every caller waiting
/// on the same tile.
#[derive(Debug, Clone, Error)]
pub enum TileError {
    /// Transport failure or non-success HTTP status.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Reading or writing the on-disk cache failed.
    #[error("I/O error on {}: {message}", path.display())]
    Io { path: PathBuf, message: String },

    /// The tile bytes are not a decodable image.
    #[error("failed to decode tile {key}: {message}")]
    Decode { key: TileKey, message: String },

    /// The key lies outside the tile grid of its zoom level.
    #[error("tile {0} is outside the grid")]
    OutOfGrid(TileKey),

    /// The tile reached the failed state, either during this request or an
    /// earlier one.
    #[error("tile {0} failed to load")]
    Failed(TileKey),

    /// The URL template is unusable.
    #[error("invalid tile URL template '{template}': {reason}")]
    InvalidTemplate { template: String, reason: String },

    #[error(transparent)]
    Coord(#[from] CoordError),
}

impl TileError {
    pub(crate) fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        TileError::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

//! Rendering and encoding errors.

use std::path::PathBuf;

use thiserror::Error;

use crate::frame::FrameError;
use crate::tile::TileError;

/// Errors that fail one output file.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A tile needed by a frame could not be loaded.
    #[error("map tile unavailable: {0}")]
    Tile(#[from] TileError),

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The encoder rejected a frame or could not be finalized.
    #[error("encoder error: {0}")]
    Encoder(String),

    /// Drawing onto the frame failed.
    #[error("compositor error: {0}")]
    Compositor(String),

    /// The range does not fit inside its segment.
    #[error("frames {start}..{end} are outside segment {segment} ({len} points)")]
    InvalidRange {
        segment: usize,
        start: usize,
        end: usize,
        len: usize,
    },

    #[error("failed to start worker pool: {0}")]
    Pool(String),

    #[error("cancelled")]
    Cancelled,
}

impl RenderError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RenderError::Io {
            path: path.into(),
            source,
        }
    }
}

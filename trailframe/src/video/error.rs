//! Video metadata and planning errors.

use std::path::PathBuf;

use thiserror::Error;

use crate::track::TrackError;

/// Errors raised while reading video metadata or merging recordings.
#[derive(Debug, Error)]
pub enum VideoError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Files of one recording do not follow each other.
    #[error("file {file_id}: expected sequence {expected}, found {found}")]
    InvalidSequence { file_id: u32, expected: u64, found: u32 },

    /// Files of one recording use different frame rates.
    #[error("file {file_id}: all parts must share one frame rate ({expected} vs {found})")]
    FrameRateMismatch {
        file_id: u32,
        expected: String,
        found: String,
    },

    /// Recordings must be listed in increasing file id order.
    #[error("file id {file_id} listed after {previous}")]
    UnorderedFileId { file_id: u32, previous: u32 },

    /// A part starts before the part it follows.
    #[error("file {file_id} part {file_seq} starts before its predecessor")]
    UnorderedStart { file_id: u32, file_seq: u32 },

    /// GPX info must pair up with video info one to one.
    #[error("{videos} video files but {gpx} GPX segments")]
    InfoCountMismatch { videos: usize, gpx: usize },

    #[error("invalid frame rate '{0}'")]
    InvalidFrameRate(String),

    /// File stem does not follow `GX-<id>-<seq>`.
    #[error("cannot derive file id from '{0}'")]
    InvalidFileName(String),

    /// A track segment has too few points to describe a recording.
    #[error("no usable segment info in {}", path.display())]
    NoSegmentInfo { path: PathBuf },

    #[error(transparent)]
    Track(#[from] TrackError),
}

impl VideoError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        VideoError::Io {
            path: path.into(),
            source,
        }
    }
}

//! Track model
//!
//! A [`Track`] is the ordered list of [`Segment`]s loaded from one file;
//! each segment is a time-ordered run of [`TrackPoint`]s from one
//! continuous recording interval.
//!
//! # Example
//!
//! ```ignore
//! use trailframe::track::{LoaderConfig, TrackLoader};
//!
//! let loader = TrackLoader::new(LoaderConfig::default().with_frequency(29.97));
//! let segments = loader.load_segments(&["day1.gpx", "day2.gpx"]);
//! ```

mod error;
mod loader;
mod point;
mod segment;

pub use error::TrackError;
pub use loader::{LoaderConfig, TrackLoader};
pub use point::TrackPoint;
pub use segment::{merge_segments, Segment, SegmentInfo, DEFAULT_IDLE_EPSILON, GRADE_WINDOW_M};

/// The segments of one recorded trip or file.
#[derive(Debug, Clone, Default)]
pub struct Track {
    segments: Vec<Segment>,
    initial_distance: f64,
}

impl Track {
    /// Creates an empty track starting at the given cumulative distance.
    pub fn new(initial_distance: f64) -> Self {
        Self {
            segments: Vec::new(),
            initial_distance,
        }
    }

    pub fn from_segments(initial_distance: f64, segments: Vec<Segment>) -> Self {
        Self {
            segments,
            initial_distance,
        }
    }

    pub fn push(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn into_segments(self) -> Vec<Segment> {
        self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn initial_distance(&self) -> f64 {
        self.initial_distance
    }

    /// Cumulative distance at the last point, or the initial distance when
    /// the track holds no points.
    pub fn total_distance(&self) -> f64 {
        match self.segments.last() {
            Some(seg) if !seg.is_empty() => seg.total_distance(),
            _ => self.initial_distance,
        }
    }

    /// Start and duration of every segment.
    pub fn infos(&self) -> Vec<SegmentInfo> {
        self.segments.iter().filter_map(Segment::info).collect()
    }
}

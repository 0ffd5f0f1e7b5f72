//! GPX track loading.
//!
//! Reads `.gpx` files with the `gpx` crate, orders the points by time,
//! derives distances, bearings and grades, and cuts the result into
//! [`Segment`]s.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use chrono::DateTime;
use tracing::{debug, info, warn};

use super::{Segment, Track, TrackError, TrackPoint, DEFAULT_IDLE_EPSILON};

/// How track files are turned into segments.
#[derive(Debug, Clone, PartialEq)]
pub struct LoaderConfig {
    /// Resampling rate in Hz; 0 keeps the raw samples.
    pub frequency: f64,
    /// Split every segment further into moving and idle stretches.
    pub split_idle: bool,
    /// Positional threshold, in degrees, for idle detection.
    pub idle_epsilon: f64,
    /// A time gap longer than this starts a new segment; 0 splits only at
    /// `<trkseg>` boundaries.
    pub max_gap_secs: f64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            frequency: 0.0,
            split_idle: false,
            idle_epsilon: DEFAULT_IDLE_EPSILON,
            max_gap_secs: 0.0,
        }
    }
}

impl LoaderConfig {
    pub fn with_frequency(mut self, frequency: f64) -> Self {
        self.frequency = frequency;
        self
    }

    pub fn with_split_idle(mut self, split_idle: bool) -> Self {
        self.split_idle = split_idle;
        self
    }

    pub fn with_idle_epsilon(mut self, epsilon: f64) -> Self {
        self.idle_epsilon = epsilon;
        self
    }

    pub fn with_max_gap_secs(mut self, secs: f64) -> Self {
        self.max_gap_secs = secs;
        self
    }
}

/// Loads GPX files into tracks.
#[derive(Debug, Clone, Default)]
pub struct TrackLoader {
    config: LoaderConfig,
}

impl TrackLoader {
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Loads one file.
    ///
    /// `initial_distance` is the cumulative distance reached by previously
    /// loaded files of the same trip.
    pub fn load(&self, path: &Path, initial_distance: f64) -> Result<Track, TrackError> {
        let file = File::open(path).map_err(|source| TrackError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let doc = gpx::read(BufReader::new(file)).map_err(|e| TrackError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let mut points = Vec::new();
        let mut missing_speed = 0usize;
        for track in &doc.tracks {
            for trkseg in &track.segments {
                for (n, wpt) in trkseg.points.iter().enumerate() {
                    let timestamp = waypoint_timestamp(path, wpt, points.len())?;
                    let geo = wpt.point();
                    let speed = wpt.speed.unwrap_or_else(|| {
                        missing_speed += 1;
                        0.0
                    });
                    let mut point = TrackPoint::new(timestamp, geo.y(), geo.x())
                        .with_speed(speed)
                        .with_elevation(wpt.elevation.unwrap_or(0.0));
                    point.is_segment_start = n == 0;
                    points.push(point);
                }
            }
        }

        if points.is_empty() {
            return Err(TrackError::Empty {
                path: path.to_path_buf(),
            });
        }
        if missing_speed > 0 {
            warn!(
                path = %path.display(),
                points = missing_speed,
                "Track points without speed, using 0"
            );
        }

        // Stable, so equal timestamps keep their file order
        points.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
        points[0].is_track_start = true;
        points[0].is_segment_start = true;

        let track = self.build_track(points, initial_distance)?;
        info!(
            path = %path.display(),
            segments = track.len(),
            distance_m = track.total_distance() - initial_distance,
            "Loaded track"
        );
        Ok(track)
    }

    /// Loads every file in order and returns all their segments.
    ///
    /// The cumulative distance carries over from one file to the next.
    /// Files that fail to load are logged and skipped.
    pub fn load_segments<P: AsRef<Path>>(&self, paths: &[P]) -> Vec<Segment> {
        let mut segments = Vec::new();
        let mut distance = 0.0;
        for path in paths {
            let path = path.as_ref();
            match self.load(path, distance) {
                Ok(track) => {
                    distance = track.total_distance();
                    segments.extend(track.into_segments());
                }
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping track file"),
            }
        }
        segments
    }

    /// Cuts the sorted points at segment boundaries and runs the per-segment
    /// passes.
    fn build_track(&self, mut points: Vec<TrackPoint>, initial_distance: f64) -> Result<Track, TrackError> {
        if self.config.max_gap_secs > 0.0 {
            for i in 1..points.len() {
                if points[i].timestamp - points[i - 1].timestamp > self.config.max_gap_secs {
                    points[i].is_segment_start = true;
                }
            }
        }

        // Distances run across boundaries so the trip total stays continuous
        let mut whole = Segment::from_points(initial_distance, 0.0, points);
        whole.update_distances();

        let mut track = Track::new(initial_distance);
        let mut run: Vec<TrackPoint> = Vec::new();
        for point in whole.iter() {
            if point.is_segment_start && !run.is_empty() {
                track.push(self.finish_segment(std::mem::take(&mut run))?);
            }
            run.push(point.clone());
        }
        if !run.is_empty() {
            track.push(self.finish_segment(run)?);
        }

        if self.config.split_idle {
            let epsilon = self.config.idle_epsilon;
            let split: Vec<Segment> = track
                .segments()
                .iter()
                .flat_map(|seg| seg.split_idle_segments(epsilon))
                .collect();
            track = Track::from_segments(initial_distance, split);
        }

        Ok(track)
    }

    fn finish_segment(&self, points: Vec<TrackPoint>) -> Result<Segment, TrackError> {
        let initial = points[0].total_distance;
        let mut seg = Segment::from_points(initial, 0.0, points);
        seg.update_bearing();
        seg.update_grade();

        if self.config.frequency > 0.0 {
            seg = seg.interpolate(self.config.frequency)?;
            seg.update_distances();
            seg.update_grade();
        }
        debug!(points = seg.len(), start_distance = initial, "Built segment");
        Ok(seg)
    }
}

fn waypoint_timestamp(path: &Path, wpt: &gpx::Waypoint, index: usize) -> Result<f64, TrackError> {
    let missing = || TrackError::MissingTime {
        path: PathBuf::from(path),
        index,
    };
    let time = wpt.time.as_ref().ok_or_else(missing)?;
    let iso = time.format().map_err(|_| missing())?;
    let parsed = DateTime::parse_from_rfc3339(&iso).map_err(|e| TrackError::Parse {
        path: path.to_path_buf(),
        message: format!("point {}: {}", index, e),
    })?;
    Ok(parsed.timestamp() as f64 + f64::from(parsed.timestamp_subsec_micros()) / 1_000_000.0)
}

//! Per-frame snapshot handed to the compositor and encoder.

use chrono::{Local, TimeZone};
use serde::Serialize;

use crate::track::TrackPoint;

/// Everything known about one output frame.
///
/// Derived on the fly for each frame and never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameState {
    /// Index of the frame within its output file.
    pub frame_index: u64,
    pub timestamp: f64,
    pub lat: f64,
    pub lon: f64,
    /// Meters per second.
    pub speed: f64,
    pub elevation: f64,
    /// Cumulative meters since the start of the trip.
    pub distance: f64,
    pub bearing: f64,
    pub grade: f64,
    /// Index of the active map in the zoom cycle.
    pub map_index: usize,
    /// Zoom level of the active map.
    pub zoom: u8,
}

impl FrameState {
    pub fn new(frame_index: u64, point: &TrackPoint, map_index: usize, zoom: u8) -> Self {
        Self {
            frame_index,
            timestamp: point.timestamp,
            lat: point.lat,
            lon: point.lon,
            speed: point.speed,
            elevation: point.elevation,
            distance: point.total_distance,
            bearing: point.bearing,
            grade: point.grade,
            map_index,
            zoom,
        }
    }

    /// Bottom label: speed, elevation and distance travelled, e.g.
    /// `"27 km/h  412 m  18.35 km"`.
    pub fn stats_label(&self) -> String {
        format!(
            "{} km/h  {} m  {:.2} km",
            (self.speed * 3.6) as i64,
            self.elevation as i64,
            self.distance / 1000.0
        )
    }

    /// Top label: local wall-clock time of the frame.
    pub fn time_label(&self) -> String {
        format_local_time(self.timestamp)
    }
}

/// Formats a Unix timestamp as local `YYYY-MM-DD HH:MM:SS`.
pub fn format_local_time(timestamp: f64) -> String {
    match Local.timestamp_opt(timestamp.floor() as i64, 0).single() {
        Some(t) => t.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => String::new(),
    }
}

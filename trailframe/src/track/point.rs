//! A single recorded (or synthesized) track sample.

use std::fmt;

use crate::geo;

/// One sample of a GPS trace.
///
/// Positional fields come from the input file; `distance_delta`,
/// `total_distance`, `bearing` and `grade` are derived by the passes on
/// [`Segment`](super::Segment).
#[derive(Debug, Clone, PartialEq)]
pub struct TrackPoint {
    /// Seconds since the Unix epoch, with sub-second precision.
    pub timestamp: f64,
    pub lat: f64,
    pub lon: f64,
    /// Meters per second.
    pub speed: f64,
    /// Meters above sea level.
    pub elevation: f64,
    /// Meters travelled since the previous point.
    pub distance_delta: f64,
    /// Cumulative meters since the start of the trip.
    pub total_distance: f64,
    /// Heading towards the next point, degrees in `[0, 360)`.
    pub bearing: f64,
    /// Local slope in percent.
    pub grade: f64,
    pub is_track_start: bool,
    pub is_segment_start: bool,
    pub valid: bool,
}

impl TrackPoint {
    /// Creates a valid point with all derived fields zeroed.
    pub fn new(timestamp: f64, lat: f64, lon: f64) -> Self {
        Self {
            timestamp,
            lat,
            lon,
            speed: 0.0,
            elevation: 0.0,
            distance_delta: 0.0,
            total_distance: 0.0,
            bearing: 0.0,
            grade: 0.0,
            is_track_start: false,
            is_segment_start: false,
            valid: true,
        }
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_elevation(mut self, elevation: f64) -> Self {
        self.elevation = elevation;
        self
    }

    /// Returns the point a fraction `t` of the way towards `next`.
    ///
    /// Scalars are interpolated linearly; the bearing follows the shorter arc.
    /// Boundary flags are kept only at `t == 0`.
    pub fn lerp(&self, next: &TrackPoint, t: f64) -> TrackPoint {
        let mix = |a: f64, b: f64| a + (b - a) * t;
        let at_start = t == 0.0;
        TrackPoint {
            timestamp: mix(self.timestamp, next.timestamp),
            lat: mix(self.lat, next.lat),
            lon: mix(self.lon, next.lon),
            speed: mix(self.speed, next.speed),
            elevation: mix(self.elevation, next.elevation),
            distance_delta: 0.0,
            total_distance: mix(self.total_distance, next.total_distance),
            bearing: geo::interpolate_bearing(self.bearing, next.bearing, t),
            grade: mix(self.grade, next.grade),
            is_track_start: at_start && self.is_track_start,
            is_segment_start: at_start && self.is_segment_start,
            valid: self.valid && next.valid,
        }
    }

    /// Speed converted to km/h.
    #[inline]
    pub fn speed_kmh(&self) -> f64 {
        self.speed * 3.6
    }
}

impl fmt::Display for TrackPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TrackPoint {} lat={} lon={} speed={} alt={}",
            self.timestamp, self.lat, self.lon, self.speed, self.elevation
        )
    }
}

//! Continuous runs of track points and the passes that derive their
//! distance, bearing and grade fields.

use std::ops::Index;

use tracing::debug;

use super::{TrackError, TrackPoint};
use crate::geo;

/// Travel distance, in meters, looked at on each side of a point when
/// computing its grade.
pub const GRADE_WINDOW_M: f64 = 50.0;

/// Below this window length, in meters, the grade is reported as flat.
const GRADE_MIN_SPAN_M: f64 = 0.01;

/// Default threshold, in degrees, below which two consecutive positions are
/// considered identical when splitting idle stretches.
pub const DEFAULT_IDLE_EPSILON: f64 = 1e-8;

/// Start time and duration of a segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentInfo {
    /// Seconds since the Unix epoch.
    pub start: f64,
    /// Seconds.
    pub duration: f64,
}

/// An ordered run of points from one continuous recording interval.
///
/// Timestamps never decrease inside a segment; [`Segment::add_point`]
/// enforces this on insertion.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Segment {
    initial_distance: f64,
    frequency: f64,
    points: Vec<TrackPoint>,
}

impl Segment {
    /// Creates an empty segment.
    ///
    /// `initial_distance` seeds the cumulative distance of the first point,
    /// `frequency` is the nominal sampling rate in Hz (0 when the segment
    /// holds raw, irregular samples).
    pub fn new(initial_distance: f64, frequency: f64) -> Self {
        Self {
            initial_distance,
            frequency,
            points: Vec::new(),
        }
    }

    /// Builds a segment from points already in timestamp order.
    ///
    /// # Panics
    ///
    /// Panics if the timestamps decrease anywhere.
    pub fn from_points(initial_distance: f64, frequency: f64, points: Vec<TrackPoint>) -> Self {
        assert!(
            points.windows(2).all(|w| w[0].timestamp <= w[1].timestamp),
            "segment timestamps must be non-decreasing"
        );
        Self {
            initial_distance,
            frequency,
            points,
        }
    }

    /// Appends a point.
    ///
    /// # Panics
    ///
    /// Panics if `point` is older than the current last point.
    pub fn add_point(&mut self, point: TrackPoint) {
        if let Some(last) = self.points.last() {
            assert!(
                last.timestamp <= point.timestamp,
                "point at {} added after {}",
                point.timestamp,
                last.timestamp
            );
        }
        self.points.push(point);
    }

    /// Inserts `points` before the current first point.
    ///
    /// # Panics
    ///
    /// Panics if the result would not be in timestamp order.
    pub fn prepend(&mut self, points: &[TrackPoint]) {
        if let (Some(tail), Some(head)) = (points.last(), self.points.first()) {
            assert!(
                tail.timestamp <= head.timestamp,
                "prepended points must precede the segment"
            );
        }
        self.points.splice(0..0, points.iter().cloned());
    }

    /// Copies the points in `[start, end)` into a new segment with the same
    /// frequency and no inherited distance.
    ///
    /// Returns `None` if the range does not fit the segment.
    pub fn extract(&self, start: usize, end: usize) -> Option<Segment> {
        if start >= self.points.len() || end > self.points.len() || end < start {
            return None;
        }
        Some(Segment {
            initial_distance: 0.0,
            frequency: self.frequency,
            points: self.points[start..end].to_vec(),
        })
    }

    pub fn initial_distance(&self) -> f64 {
        self.initial_distance
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[TrackPoint] {
        &self.points
    }

    pub fn get(&self, index: usize) -> Option<&TrackPoint> {
        self.points.get(index)
    }

    pub fn first(&self) -> Option<&TrackPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&TrackPoint> {
        self.points.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TrackPoint> {
        self.points.iter()
    }

    /// Cumulative distance at the end of the segment, or the inherited
    /// distance if it is empty.
    pub fn total_distance(&self) -> f64 {
        self.points
            .last()
            .map(|p| p.total_distance)
            .unwrap_or(self.initial_distance)
    }

    /// Recomputes `distance_delta` and `total_distance` for every point.
    ///
    /// The first point starts at the inherited distance. Must be run again
    /// after any reordering or resampling.
    pub fn update_distances(&mut self) {
        let mut total = self.initial_distance;
        let mut prev: Option<(f64, f64)> = None;
        for p in &mut self.points {
            let delta = match prev {
                Some((lat, lon)) => geo::distance(lat, lon, p.lat, p.lon),
                None => 0.0,
            };
            total += delta;
            p.distance_delta = delta;
            p.total_distance = total;
            prev = Some((p.lat, p.lon));
        }
    }

    /// Recomputes the heading of every point towards its successor.
    ///
    /// A bearing of exactly 0 means the two points coincide (or the heading
    /// is due north, which cannot be told apart); it is replaced by the
    /// previous point's bearing. The last point keeps the heading of the one
    /// before it.
    pub fn update_bearing(&mut self) {
        let n = self.points.len();
        for i in 0..n.saturating_sub(1) {
            let (a, b) = (&self.points[i], &self.points[i + 1]);
            let mut bearing = geo::bearing(a.lat, a.lon, b.lat, b.lon);
            if bearing == 0.0 && i > 0 {
                bearing = self.points[i - 1].bearing;
            }
            self.points[i].bearing = bearing;
        }
        if n > 1 {
            self.points[n - 1].bearing = self.points[n - 2].bearing;
        }
    }

    /// Recomputes the grade of every point but the last, which stays flat.
    ///
    /// Requires up-to-date distance deltas.
    pub fn update_grade(&mut self) {
        let n = self.points.len();
        let grades: Vec<f64> = (0..n.saturating_sub(1))
            .map(|i| grade_at(&self.points, i))
            .collect();
        for (p, g) in self.points.iter_mut().zip(grades) {
            p.grade = g;
        }
        if let Some(last) = self.points.last_mut() {
            last.grade = 0.0;
        }
    }

    /// Finds the point `i` with `points[i].timestamp <= timestamp <
    /// points[i + 1].timestamp`, scanning forward from `*cursor`.
    ///
    /// On success the cursor is moved to `i`, so a sequence of lookups with
    /// non-decreasing timestamps never rescans. Returns `None` if the cursor
    /// is past the end, if `timestamp` precedes the point under the cursor,
    /// or if no later pair brackets it.
    pub fn closest_point(&self, timestamp: f64, cursor: &mut usize) -> Option<&TrackPoint> {
        let start = *cursor;
        let current = self.points.get(start)?;
        if timestamp < current.timestamp {
            return None;
        }

        let found = self.points[start..]
            .windows(2)
            .position(|w| w[0].timestamp <= timestamp && timestamp < w[1].timestamp)?;
        *cursor = start + found;
        self.points.get(*cursor)
    }

    /// Start time and duration of the segment.
    ///
    /// Some recorders flush their final samples with one shared timestamp.
    /// Those trailing repeats each add one sample period to the duration,
    /// using the nominal frequency or, for raw segments, the average rate of
    /// the preceding samples.
    pub fn info(&self) -> Option<SegmentInfo> {
        let first = self.points.first()?;
        let last = self.points.last()?;
        let span = last.timestamp - first.timestamp;

        let repeats = self
            .points
            .iter()
            .rev()
            .take_while(|p| p.timestamp == last.timestamp)
            .count();

        let mut duration = span;
        if repeats > 1 {
            let rate = if self.frequency > 0.0 {
                self.frequency
            } else if span > 0.0 {
                (self.points.len() - repeats) as f64 / span
            } else {
                0.0
            };
            if rate > 0.0 {
                duration += (repeats - 1) as f64 / rate;
            }
        }

        Some(SegmentInfo {
            start: first.timestamp,
            duration,
        })
    }

    /// Splits the segment into maximal runs of moving and idle points.
    ///
    /// A point is idle when neither its latitude nor its longitude differs
    /// from its predecessor's by `epsilon` or more. The first point takes
    /// the state of the second. Each run becomes its own segment, flagged as
    /// a segment start and inheriting the cumulative distance at its first
    /// point.
    pub fn split_idle_segments(&self, epsilon: f64) -> Vec<Segment> {
        let n = self.points.len();
        if n == 0 {
            return Vec::new();
        }

        let idle: Vec<bool> = (0..n)
            .map(|i| {
                let (a, b) = match i {
                    0 if n > 1 => (&self.points[0], &self.points[1]),
                    0 => return false,
                    _ => (&self.points[i - 1], &self.points[i]),
                };
                (b.lat - a.lat).abs() < epsilon && (b.lon - a.lon).abs() < epsilon
            })
            .collect();

        let mut out = Vec::new();
        let mut start = 0;
        for i in 1..=n {
            if i == n || idle[i] != idle[start] {
                let mut points = self.points[start..i].to_vec();
                points[0].is_segment_start = true;
                let initial_distance = if start == 0 {
                    self.initial_distance
                } else {
                    points[0].total_distance
                };
                out.push(Segment {
                    initial_distance,
                    frequency: self.frequency,
                    points,
                });
                start = i;
            }
        }

        let total: usize = out.iter().map(Segment::len).sum();
        assert_eq!(total, n, "idle split lost points");
        debug!(points = n, segments = out.len(), "Split idle segments");
        out
    }

    /// Resamples the segment to `frequency` Hz.
    ///
    /// Each gap between two original points of `dt` seconds receives
    /// `round(dt * frequency)` evenly spaced points, the first of which is
    /// the original point itself; the final original point closes the
    /// segment. Distances are carried by interpolation and should be
    /// refreshed with [`Segment::update_distances`].
    pub fn interpolate(&self, frequency: f64) -> Result<Segment, TrackError> {
        if !(frequency > 0.0 && frequency.is_finite()) {
            return Err(TrackError::InvalidFrequency(frequency));
        }

        let mut out = Segment::new(self.initial_distance, frequency);
        for (index, w) in self.points.windows(2).enumerate() {
            let (a, b) = (&w[0], &w[1]);
            let dt = b.timestamp - a.timestamp;
            if dt == 0.0 {
                return Err(TrackError::DuplicateTimestamp {
                    index,
                    timestamp: a.timestamp,
                });
            }

            let steps = (dt * frequency).round() as usize;
            for j in 0..steps {
                let t = j as f64 / frequency / dt;
                let mut p = a.lerp(b, t);
                // Keep timestamps on the exact sample grid
                p.timestamp = a.timestamp + j as f64 / frequency;
                out.points.push(p);
            }
        }
        if let Some(last) = self.points.last() {
            out.points.push(last.clone());
        }

        debug!(
            from = self.points.len(),
            to = out.points.len(),
            frequency,
            "Interpolated segment"
        );
        Ok(out)
    }
}

impl Index<usize> for Segment {
    type Output = TrackPoint;

    fn index(&self, index: usize) -> &TrackPoint {
        &self.points[index]
    }
}

impl<'a> IntoIterator for &'a Segment {
    type Item = &'a TrackPoint;
    type IntoIter = std::slice::Iter<'a, TrackPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

/// Concatenates the points of `segments` in list order, without re-sorting.
///
/// The result inherits the initial distance and frequency of the first
/// segment. Used to build the whole-trip overview.
pub fn merge_segments(segments: &[Segment]) -> Segment {
    let mut merged = match segments.first() {
        Some(first) => Segment::new(first.initial_distance, first.frequency),
        None => Segment::default(),
    };
    for seg in segments {
        merged.points.extend(seg.points.iter().cloned());
    }
    merged
}

/// Slope at point `i` across a window of about [`GRADE_WINDOW_M`] on each
/// side.
fn grade_at(points: &[TrackPoint], i: usize) -> f64 {
    let mut left_dist = 0.0;
    let mut left_elev = 0.0;
    for p in points[..=i].iter().rev() {
        left_dist += p.distance_delta;
        left_elev = p.elevation;
        if left_dist >= GRADE_WINDOW_M {
            break;
        }
    }

    let mut right_dist = 0.0;
    let mut right_elev = 0.0;
    for p in &points[i..] {
        right_dist += p.distance_delta;
        right_elev = p.elevation;
        if right_dist >= GRADE_WINDOW_M {
            break;
        }
    }

    let span = left_dist + right_dist;
    if span < GRADE_MIN_SPAN_M {
        return 0.0;
    }
    (right_elev - left_elev) / span * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Points one second apart moving north by `step` degrees each.
    fn northbound(start: f64, count: usize, step: f64) -> Segment {
        let mut seg = Segment::new(0.0, 0.0);
        for i in 0..count {
            seg.add_point(TrackPoint::new(start + i as f64, 45.0 + i as f64 * step, 7.0));
        }
        seg
    }

    #[test]
    #[should_panic(expected = "added after")]
    fn test_add_point_rejects_older_timestamp() {
        let mut seg = Segment::new(0.0, 0.0);
        seg.add_point(TrackPoint::new(10.0, 0.0, 0.0));
        seg.add_point(TrackPoint::new(9.0, 0.0, 0.0));
    }

    #[test]
    fn test_add_point_accepts_equal_timestamp() {
        let mut seg = Segment::new(0.0, 0.0);
        seg.add_point(TrackPoint::new(10.0, 0.0, 0.0));
        seg.add_point(TrackPoint::new(10.0, 0.0, 0.0));
        assert_eq!(seg.len(), 2);
    }

    #[test]
    fn test_update_distances_seeds_initial_distance() {
        let mut seg = northbound(0.0, 3, 0.001);
        seg.initial_distance = 500.0;
        seg.update_distances();

        assert_eq!(seg[0].distance_delta, 0.0);
        assert_eq!(seg[0].total_distance, 500.0);
        assert!((seg[1].distance_delta - 111.19).abs() < 0.1);
        assert!((seg[2].total_distance - (500.0 + 2.0 * seg[1].distance_delta)).abs() < 0.1);
        assert_eq!(seg.total_distance(), seg[2].total_distance);
    }

    #[test]
    fn test_update_bearing_substitutes_degenerate_zero() {
        let mut seg = Segment::new(0.0, 0.0);
        seg.add_point(TrackPoint::new(0.0, 0.0, 0.0));
        seg.add_point(TrackPoint::new(1.0, 0.0, 0.001)); // east
        seg.add_point(TrackPoint::new(2.0, 0.0, 0.001)); // stationary
        seg.add_point(TrackPoint::new(3.0, 0.0, 0.002));
        seg.update_bearing();

        assert!((seg[0].bearing - 90.0).abs() < 1e-6);
        // Stationary step computes to 0 and inherits 90
        assert!((seg[1].bearing - 90.0).abs() < 1e-6);
        assert!((seg[2].bearing - 90.0).abs() < 1e-6);
        assert_eq!(seg[3].bearing, seg[2].bearing);
    }

    #[test]
    fn test_update_bearing_first_point_keeps_zero() {
        let mut seg = Segment::new(0.0, 0.0);
        seg.add_point(TrackPoint::new(0.0, 1.0, 1.0));
        seg.add_point(TrackPoint::new(1.0, 1.0, 1.0));
        seg.update_bearing();
        assert_eq!(seg[0].bearing, 0.0);
    }

    #[test]
    fn test_update_grade_climb() {
        // 10 m steps north, 1 m climb per step. Both windows include the
        // point's own delta, so 10 m of climb spread over 120 m.
        let mut seg = Segment::new(0.0, 0.0);
        let step = 10.0 / 111_194.93;
        for i in 0..30 {
            seg.add_point(
                TrackPoint::new(i as f64, i as f64 * step, 0.0).with_elevation(i as f64),
            );
        }
        seg.update_distances();
        seg.update_grade();

        assert!((seg[15].grade - 8.33).abs() < 0.5, "got {}", seg[15].grade);
        assert_eq!(seg[29].grade, 0.0);
    }

    #[test]
    fn test_update_grade_stationary_is_flat() {
        let mut seg = Segment::new(0.0, 0.0);
        seg.add_point(TrackPoint::new(0.0, 1.0, 1.0).with_elevation(10.0));
        seg.add_point(TrackPoint::new(1.0, 1.0, 1.0).with_elevation(20.0));
        seg.add_point(TrackPoint::new(2.0, 1.0, 1.0).with_elevation(30.0));
        seg.update_distances();
        seg.update_grade();
        assert!(seg.iter().all(|p| p.grade == 0.0));
    }

    #[test]
    fn test_closest_point_brackets_timestamp() {
        let seg = northbound(1000.0, 10, 0.0001);
        let mut cursor = 0;

        let p = seg.closest_point(1003.5, &mut cursor).unwrap();
        assert_eq!(p.timestamp, 1003.0);
        assert_eq!(cursor, 3);

        let p = seg.closest_point(1007.0, &mut cursor).unwrap();
        assert_eq!(p.timestamp, 1007.0);
        assert_eq!(cursor, 7);
    }

    #[test]
    fn test_closest_point_rejects_before_cursor() {
        let seg = northbound(1000.0, 10, 0.0001);
        let mut cursor = 5;
        assert!(seg.closest_point(1002.0, &mut cursor).is_none());
        assert_eq!(cursor, 5);
    }

    #[test]
    fn test_closest_point_past_end() {
        let seg = northbound(1000.0, 10, 0.0001);
        let mut cursor = 10;
        assert!(seg.closest_point(1005.0, &mut cursor).is_none());

        // The last timestamp has no successor to bracket it
        let mut cursor = 0;
        assert!(seg.closest_point(1009.0, &mut cursor).is_none());
        assert_eq!(cursor, 0);
    }

    #[test]
    fn test_info_plain() {
        let seg = northbound(1000.0, 11, 0.0001);
        let info = seg.info().unwrap();
        assert_eq!(info.start, 1000.0);
        assert_eq!(info.duration, 10.0);
    }

    #[test]
    fn test_info_extends_repeated_trailing_timestamps() {
        let mut seg = Segment::new(0.0, 0.0);
        for i in 0..=10 {
            seg.add_point(TrackPoint::new(i as f64, 0.0, 0.0));
        }
        seg.add_point(TrackPoint::new(10.0, 0.0, 0.0));
        seg.add_point(TrackPoint::new(10.0, 0.0, 0.0));

        // 10 samples over 10 s before the repeats: 1 Hz, two extra periods
        let info = seg.info().unwrap();
        assert!((info.duration - 12.0).abs() < 1e-9);

        let resampled = Segment::from_points(0.0, 2.0, seg.points.clone());
        assert!((resampled.info().unwrap().duration - 11.0).abs() < 1e-9);
    }

    #[test]
    fn test_info_empty() {
        assert!(Segment::new(0.0, 0.0).info().is_none());
    }

    #[test]
    fn test_split_idle_segments() {
        let mut seg = Segment::new(0.0, 0.0);
        // moving, moving, idle, idle, moving
        seg.add_point(TrackPoint::new(0.0, 0.0, 0.0));
        seg.add_point(TrackPoint::new(1.0, 0.001, 0.0));
        seg.add_point(TrackPoint::new(2.0, 0.002, 0.0));
        seg.add_point(TrackPoint::new(3.0, 0.002, 0.0));
        seg.add_point(TrackPoint::new(4.0, 0.002, 0.0));
        seg.add_point(TrackPoint::new(5.0, 0.003, 0.0));
        seg.update_distances();

        let parts = seg.split_idle_segments(DEFAULT_IDLE_EPSILON);
        let lens: Vec<usize> = parts.iter().map(Segment::len).collect();
        assert_eq!(lens, vec![3, 2, 1]);
        assert!(parts.iter().all(|s| s[0].is_segment_start));
        assert_eq!(parts[1].initial_distance(), parts[1][0].total_distance);
    }

    #[test]
    fn test_split_idle_single_point() {
        let mut seg = Segment::new(0.0, 0.0);
        seg.add_point(TrackPoint::new(0.0, 0.0, 0.0));
        assert_eq!(seg.split_idle_segments(DEFAULT_IDLE_EPSILON).len(), 1);
    }

    #[test]
    fn test_interpolate_point_count() {
        let seg = northbound(0.0, 11, 0.0001);
        let out = seg.interpolate(30.0).unwrap();
        assert_eq!(out.len(), 10 * 30 + 1);
        assert_eq!(out.frequency(), 30.0);
        assert_eq!(out[0].timestamp, 0.0);
        assert!((out[15].timestamp - 0.5).abs() < 1e-12);
        assert!((out[15].lat - 45.00005).abs() < 1e-9);
        assert_eq!(out.last().unwrap().timestamp, 10.0);
    }

    #[test]
    fn test_interpolate_bearing_takes_shorter_arc() {
        let mut a = TrackPoint::new(0.0, 0.0, 0.0);
        a.bearing = 350.0;
        let mut b = TrackPoint::new(1.0, 0.0, 0.0);
        b.bearing = 10.0;
        let seg = Segment::from_points(0.0, 0.0, vec![a, b]);

        let out = seg.interpolate(4.0).unwrap();
        assert!((out[1].bearing - 355.0).abs() < 1e-9);
        assert!((out[3].bearing - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_interpolate_duplicate_timestamp_fails() {
        let mut seg = Segment::new(0.0, 0.0);
        seg.add_point(TrackPoint::new(0.0, 0.0, 0.0));
        seg.add_point(TrackPoint::new(1.0, 0.0, 0.0));
        seg.add_point(TrackPoint::new(1.0, 0.0, 0.0));
        let err = seg.interpolate(10.0).unwrap_err();
        assert!(matches!(err, TrackError::DuplicateTimestamp { index: 1, .. }));
    }

    #[test]
    fn test_interpolate_rejects_bad_frequency() {
        let seg = northbound(0.0, 3, 0.0001);
        assert!(matches!(
            seg.interpolate(0.0),
            Err(TrackError::InvalidFrequency(_))
        ));
    }

    #[test]
    fn test_extract_and_prepend() {
        let seg = northbound(0.0, 10, 0.0001);
        let part = seg.extract(2, 5).unwrap();
        assert_eq!(part.len(), 3);
        assert_eq!(part[0].timestamp, 2.0);
        assert!(seg.extract(5, 11).is_none());
        assert!(seg.extract(10, 10).is_none());

        let mut tail = seg.extract(5, 10).unwrap();
        tail.prepend(&seg.points()[0..5]);
        assert_eq!(tail.points(), seg.points());
    }

    #[test]
    fn test_merge_segments_preserves_order() {
        let a = northbound(0.0, 3, 0.0001);
        let b = northbound(100.0, 2, 0.0001);
        let merged = merge_segments(&[a, b]);
        assert_eq!(merged.len(), 5);
        assert_eq!(merged[3].timestamp, 100.0);
        assert!(merge_segments(&[]).is_empty());
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn arb_segment() -> impl Strategy<Value = Segment> {
            prop::collection::vec((0.0..5.0_f64, -0.001..0.001_f64, -0.001..0.001_f64), 1..60)
                .prop_map(|steps| {
                    let mut seg = Segment::new(0.0, 0.0);
                    let (mut t, mut lat, mut lon) = (0.0, 45.0, 7.0);
                    for (dt, dlat, dlon) in steps {
                        t += dt;
                        lat += dlat;
                        lon += dlon;
                        seg.add_point(TrackPoint::new(t, lat, lon));
                    }
                    seg
                })
        }

        proptest! {
            #[test]
            fn test_total_distance_non_decreasing(mut seg in arb_segment()) {
                seg.update_distances();
                for w in seg.points().windows(2) {
                    prop_assert!(w[0].total_distance <= w[1].total_distance);
                }
            }

            #[test]
            fn test_idle_split_is_lossless(seg in arb_segment()) {
                let parts = seg.split_idle_segments(1e-4);
                let total: usize = parts.iter().map(Segment::len).sum();
                prop_assert_eq!(total, seg.len());
            }

            #[test]
            fn test_interpolation_rate_preserving(
                seconds in 1usize..120,
                frequency in prop::sample::select(vec![1.0, 10.0, 25.0, 30.0, 60.0])
            ) {
                let mut seg = Segment::new(0.0, 1.0);
                for i in 0..=seconds {
                    seg.add_point(TrackPoint::new(i as f64, 45.0, 7.0 + i as f64 * 1e-4));
                }
                let out = seg.interpolate(frequency)?;
                let expected = seconds as f64 * frequency + 1.0;
                prop_assert!((out.len() as f64 - expected).abs() <= 1.0);

                let again = seg.interpolate(frequency)?;
                prop_assert_eq!(out, again);
            }

            #[test]
            fn test_closest_point_monotonic(
                seg in arb_segment(),
                mut queries in prop::collection::vec(0.0..300.0_f64, 1..20)
            ) {
                queries.sort_by(|a, b| a.partial_cmp(b).unwrap());
                let mut cursor = 0;
                let mut last_cursor = 0;
                for t in queries {
                    if let Some(p) = seg.closest_point(t, &mut cursor) {
                        prop_assert!(p.timestamp <= t);
                        prop_assert!(t < seg[cursor + 1].timestamp);
                        prop_assert!(cursor >= last_cursor);
                        last_cursor = cursor;
                    }
                }
            }
        }
    }
}

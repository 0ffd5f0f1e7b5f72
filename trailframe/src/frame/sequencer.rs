//! Frame-by-frame walk over a track.

use tracing::debug;

use super::{FrameError, FrameState, MapSwitcher, ZoomLevel, ZoomOverride};
use crate::track::{Segment, TrackPoint};

/// Runs a fresh [`MapSwitcher`] over every point of a resampled segment,
/// treating point `i` as frame `i`, and returns the selected map index per
/// point.
///
/// The override policy sees the segment's first-to-last timestamp span as
/// its duration.
pub fn assign_map_indices<O: ZoomOverride>(
    segment: &Segment,
    fps: f64,
    levels: &[ZoomLevel],
    policy: O,
) -> Result<Vec<usize>, FrameError> {
    if !(fps > 0.0 && fps.is_finite()) {
        return Err(FrameError::InvalidFps(fps));
    }
    let duration = match (segment.first(), segment.last()) {
        (Some(first), Some(last)) => last.timestamp - first.timestamp,
        _ => 0.0,
    };
    let mut switcher = MapSwitcher::from_levels(levels, policy, duration)?;
    let indices: Vec<usize> = (0..segment.len() as u64)
        .map(|i| switcher.compute_state(i, fps))
        .collect();
    debug!(points = indices.len(), duration, "Assigned zoom levels");
    Ok(indices)
}

/// Frame states for a resampled segment whose zoom selection was computed
/// up front with [`assign_map_indices`].
pub struct FrameSequencer<'a> {
    segment: &'a Segment,
    map_indices: &'a [usize],
    levels: &'a [ZoomLevel],
}

impl<'a> FrameSequencer<'a> {
    pub fn new(segment: &'a Segment, map_indices: &'a [usize], levels: &'a [ZoomLevel]) -> Self {
        debug_assert_eq!(segment.len(), map_indices.len());
        Self {
            segment,
            map_indices,
            levels,
        }
    }

    /// State of the frame at `point_index` in the segment, numbered
    /// `frame_index` within its output file.
    pub fn state(&self, point_index: usize, frame_index: u64) -> Option<FrameState> {
        let point = self.segment.get(point_index)?;
        let map_index = *self.map_indices.get(point_index)?;
        let zoom = self.levels.get(map_index)?.zoom;
        Some(FrameState::new(frame_index, point, map_index, zoom))
    }
}

/// Derives per-frame positions from a raw (not resampled) segment by
/// interpolating between the samples that bracket each frame's time.
///
/// Frame `i` sits at `first.timestamp + i / fps`. Lookups must use
/// non-decreasing frame indices.
pub struct FrameCursor<'a> {
    segment: &'a Segment,
    first: usize,
    last: usize,
    next: usize,
}

impl<'a> FrameCursor<'a> {
    /// Walks the points in `[first, last)`.
    pub fn new(segment: &'a Segment, first: usize, last: usize) -> Self {
        let last = last.min(segment.len());
        Self {
            segment,
            first,
            last,
            next: first,
        }
    }

    /// Covers the whole segment.
    pub fn whole(segment: &'a Segment) -> Self {
        Self::new(segment, 0, segment.len())
    }

    /// Interpolated point for frame `frame_index`, or `None` once the frame
    /// time runs past the covered points.
    pub fn point_at(&mut self, frame_index: u64, fps: f64) -> Option<TrackPoint> {
        let start = self.segment.get(self.first)?.timestamp;
        if self.next >= self.last {
            return None;
        }
        let time = start + frame_index as f64 / fps;

        let mut cursor = self.next;
        let item = self.segment.closest_point(time, &mut cursor)?.clone();
        if cursor >= self.last {
            return None;
        }
        self.next = cursor;

        let point = match self.segment.get(cursor + 1) {
            Some(next) => {
                let dt = next.timestamp - item.timestamp;
                let mut p = item.lerp(next, (time - item.timestamp) / dt);
                p.timestamp = time;
                p
            }
            None => item,
        };
        Some(point)
    }
}

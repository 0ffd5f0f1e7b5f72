//! Warming the tile cache ahead of rendering.
//!
//! Every frame needs the tile under the position and its eight
//! neighbours, so those are the tiles collected along the track.

use std::collections::HashSet;

use rayon::prelude::*;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{TileCache, TileSource};
use crate::coord::{self, TileKey};
use crate::track::Segment;

/// Counts from one prefetch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrefetchReport {
    pub requested: usize,
    pub loaded: usize,
    pub failed: usize,
    /// Not attempted because the run was cancelled.
    pub skipped: usize,
}

/// Distinct tiles shown while following the segments at `zoom`, in order
/// of first use.
pub fn tiles_along(segments: &[Segment], zoom: u8) -> Vec<TileKey> {
    let mut seen = HashSet::new();
    let mut keys = Vec::new();
    let mut last_center = None;

    for point in segments.iter().flat_map(|s| s.iter()) {
        let Ok(center) = coord::to_tile_key(point.lat, point.lon, zoom) else {
            continue;
        };
        if last_center == Some(center) {
            continue;
        }
        last_center = Some(center);

        for dy in -1..=1 {
            for dx in -1..=1 {
                if let Some(key) = center.neighbor(dx, dy) {
                    if seen.insert(key) {
                        keys.push(key);
                    }
                }
            }
        }
    }

    debug!(zoom, tiles = keys.len(), "Collected tiles along track");
    keys
}

impl<S: TileSource> TileCache<S> {
    /// Loads `keys` in parallel on the current rayon pool.
    ///
    /// Failures are counted, not returned; the cancellation token stops
    /// new fetches but lets running ones finish.
    pub fn prefetch(&self, keys: &[TileKey], cancellation: &CancellationToken) -> PrefetchReport {
        let outcomes: Vec<Option<bool>> = keys
            .par_iter()
            .map(|key| {
                if cancellation.is_cancelled() {
                    return None;
                }
                Some(self.get_tile(key.x, key.y, key.zoom).is_ok())
            })
            .collect();

        let report = PrefetchReport {
            requested: keys.len(),
            loaded: outcomes.iter().filter(|o| **o == Some(true)).count(),
            failed: outcomes.iter().filter(|o| **o == Some(false)).count(),
            skipped: outcomes.iter().filter(|o| o.is_none()).count(),
        };
        info!(
            requested = report.requested,
            loaded = report.loaded,
            failed = report.failed,
            skipped = report.skipped,
            "Prefetch finished"
        );
        report
    }
}

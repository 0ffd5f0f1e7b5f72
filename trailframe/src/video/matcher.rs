//! Matching recorded videos against track segments.

use std::path::Path;

use tracing::{debug, info, warn};

use super::{GpxInfo, VideoError, VideoInfo};
use crate::track::{LoaderConfig, Segment, TrackLoader};

/// Points of one segment covering a requested time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentRange {
    pub segment_index: usize,
    /// Latest point at or before the window start.
    pub start_index: usize,
    /// Latest point at or before the window end.
    pub end_index: usize,
}

impl SegmentRange {
    /// Points available from the start of the range to the end of its
    /// segment.
    pub fn remaining(&self, segments: &[Segment]) -> usize {
        segments
            .get(self.segment_index)
            .map_or(0, |s| s.len().saturating_sub(self.start_index))
    }
}

/// Merges the consecutive parts of each recording into one descriptor.
///
/// Parts belong together when they share a file id. Within a recording,
/// part numbers must increase by one and the frame rate must not change;
/// either violation fails the whole call. The merged descriptor sums the
/// frame counts and spans from the first part's start to the end of the
/// last part.
pub fn compute_map_segments(videos: &[VideoInfo]) -> Result<Vec<VideoInfo>, VideoError> {
    let mut merged_all = Vec::new();
    let mut previous_id: Option<u32> = None;
    let mut i = 0;

    while i < videos.len() {
        let mut merged = videos[i].clone();
        if let Some(previous) = previous_id {
            if merged.file_id <= previous {
                return Err(VideoError::UnorderedFileId {
                    file_id: merged.file_id,
                    previous,
                });
            }
        }

        let mut seq = merged.file_seq;
        let mut j = i + 1;
        while let Some(next) = videos.get(j) {
            if next.file_id != merged.file_id {
                break;
            }
            if seq.checked_add(1) != Some(next.file_seq) {
                return Err(VideoError::InvalidSequence {
                    file_id: merged.file_id,
                    expected: u64::from(seq) + 1,
                    found: next.file_seq,
                });
            }
            if next.frame_rate != merged.frame_rate {
                return Err(VideoError::FrameRateMismatch {
                    file_id: merged.file_id,
                    expected: merged.frame_rate.to_string(),
                    found: next.frame_rate.to_string(),
                });
            }
            if next.start < merged.start {
                return Err(VideoError::UnorderedStart {
                    file_id: next.file_id,
                    file_seq: next.file_seq,
                });
            }

            merged.frame_count += next.frame_count;
            merged.duration = (next.start - merged.start) as f64 + next.duration;
            seq = next.file_seq;
            j += 1;
        }

        debug!(
            file_id = merged.file_id,
            parts = j - i,
            frame_count = merged.frame_count,
            duration = merged.duration,
            "Merged recording"
        );
        previous_id = Some(merged.file_id);
        merged_all.push(merged);
        i = j;
    }

    Ok(merged_all)
}

/// Like [`compute_map_segments`], but takes each part's start and duration
/// from the GPS log recorded with it. `gpx[i]` belongs to `videos[i]`.
pub fn compute_map_segments_with_gpx(videos: &[VideoInfo], gpx: &[GpxInfo]) -> Result<Vec<VideoInfo>, VideoError> {
    if videos.len() != gpx.len() {
        return Err(VideoError::InfoCountMismatch {
            videos: videos.len(),
            gpx: gpx.len(),
        });
    }

    let timed: Vec<VideoInfo> = videos
        .iter()
        .zip(gpx)
        .map(|(v, g)| v.clone().with_timing(g.start, g.duration))
        .collect();
    compute_map_segments(&timed)
}

/// Reads the timing of every segment of the GPS logs recorded by the
/// cameras, in file order. Logs are read without resampling.
pub fn load_video_gpx<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<GpxInfo>, VideoError> {
    let loader = TrackLoader::new(LoaderConfig::default());
    let mut infos = Vec::new();

    for path in paths {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading video GPS log");
        let track = loader.load(path, 0.0)?;
        for segment in track.segments() {
            let info = segment.info().ok_or_else(|| VideoError::NoSegmentInfo {
                path: path.to_path_buf(),
            })?;
            info!(
                path = %path.display(),
                start = info.start,
                duration = info.duration,
                "Video GPS segment"
            );
            infos.push(GpxInfo::from(info));
        }
    }

    Ok(infos)
}

/// Finds the first segment holding both ends of the window
/// `[start, start + duration]`.
///
/// Windows are never stitched across segments: if no single segment covers
/// both ends, the result is `None`.
pub fn get_segment_range(segments: &[Segment], start: f64, duration: f64) -> Option<SegmentRange> {
    for (segment_index, segment) in segments.iter().enumerate() {
        let mut cursor = 0;
        if segment.closest_point(start, &mut cursor).is_none() {
            continue;
        }
        let start_index = cursor;

        if segment.closest_point(start + duration, &mut cursor).is_none() {
            continue;
        }

        return Some(SegmentRange {
            segment_index,
            start_index,
            end_index: cursor,
        });
    }

    warn!(start, duration, "No segment covers the requested window");
    None
}

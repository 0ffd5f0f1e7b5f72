//! Encoding plans: which frames of which segment go into which file.
//!
//! Frames here are points of a resampled segment, so frame `i` of a range
//! is point `start_frame + i`.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::{get_segment_range, FrameRate, VideoError, VideoInfo};
use crate::frame::format_local_time;
use crate::track::Segment;

/// Longest output file, in seconds of video.
pub const DEFAULT_MAX_CHUNK_SECS: u32 = 300;

/// One output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingRange {
    pub segment_index: usize,
    /// First point of the segment to encode.
    pub start_frame: usize,
    pub frame_count: usize,
    /// Recording or segment this file belongs to.
    pub file_id: u32,
    /// Position of this file within its recording.
    pub chunk: u32,
}

impl EncodingRange {
    /// One past the last point encoded.
    pub fn end_frame(&self) -> usize {
        self.start_frame + self.frame_count
    }

    /// `<file_id>-<chunk> - <local time of first frame>.mp4`, with the
    /// time's colons replaced so the name is valid everywhere.
    ///
    /// `None` if the range does not start inside its segment.
    pub fn file_name(&self, segments: &[Segment]) -> Option<String> {
        let first = segments.get(self.segment_index)?.get(self.start_frame)?;
        let time = format_local_time(first.timestamp).replace(':', "-");
        Some(format!("{:03}-{:03} - {}.mp4", self.file_id, self.chunk, time))
    }
}

/// Splits `frame_count` frames starting at `start_frame` into chunks of at
/// most `frames_per_chunk`.
fn chunked(
    segment_index: usize,
    start_frame: usize,
    frame_count: usize,
    frames_per_chunk: usize,
    file_id: u32,
) -> impl Iterator<Item = EncodingRange> {
    let frames_per_chunk = frames_per_chunk.max(1);
    let chunks = frame_count.div_ceil(frames_per_chunk);
    (0..chunks).map(move |chunk| {
        let offset = chunk * frames_per_chunk;
        EncodingRange {
            segment_index,
            start_frame: start_frame + offset,
            frame_count: frames_per_chunk.min(frame_count - offset),
            file_id,
            chunk: chunk as u32,
        }
    })
}

/// One file per recorded video, matched by time against the segments.
///
/// Videos that no segment covers are logged and skipped; gaps in the GPS
/// data are expected. A video longer than the points left in its segment
/// is cut short. Long videos are split into files of at most
/// `max_chunk_secs`.
pub fn plan_for_videos(segments: &[Segment], videos: &[VideoInfo], fps: f64, max_chunk_secs: u32) -> Vec<EncodingRange> {
    let frames_per_chunk = (fps * f64::from(max_chunk_secs)) as usize;
    let mut ranges = Vec::new();

    for video in videos {
        let Some(range) = get_segment_range(segments, video.start as f64, video.duration) else {
            warn!(
                file_id = video.file_id,
                path = %video.path.display(),
                "No matching GPS data for video"
            );
            continue;
        };

        let available = range.remaining(segments);
        let frame_count = usize::try_from(video.frame_count).map_or(available, |n| n.min(available));
        ranges.extend(chunked(
            range.segment_index,
            range.start_index,
            frame_count,
            frames_per_chunk,
            video.file_id,
        ));
    }

    info!(videos = videos.len(), files = ranges.len(), "Planned video overlays");
    ranges
}

/// One file per segment, covering it entirely.
pub fn plan_per_segment(segments: &[Segment]) -> Vec<EncodingRange> {
    segments
        .iter()
        .enumerate()
        .filter(|(_, s)| !s.is_empty())
        .map(|(i, s)| EncodingRange {
            segment_index: i,
            start_frame: 0,
            frame_count: s.len(),
            file_id: 0,
            chunk: i as u32,
        })
        .collect()
}

/// Files to join back together after a balanced encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcatList {
    /// `<first file>.lst`.
    pub name: String,
    pub files: Vec<String>,
}

impl ConcatList {
    /// Concat demuxer input: one `file '<name>'` line per file.
    pub fn contents(&self) -> String {
        self.files.iter().map(|f| format!("file '{}'\n", f)).collect()
    }

    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, VideoError> {
        let path = dir.join(&self.name);
        fs::write(&path, self.contents()).map_err(|e| VideoError::io(&path, e))?;
        Ok(path)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BalancedPlan {
    pub ranges: Vec<EncodingRange>,
    pub concat_lists: Vec<ConcatList>,
}

/// Cuts every segment into pieces of about `total_frames / workers`
/// frames so that all workers stay busy, and lists the pieces of each
/// segment for rejoining.
pub fn plan_balanced(segments: &[Segment], workers: usize) -> BalancedPlan {
    let total: usize = segments.iter().map(Segment::len).sum();
    let per_worker = (total / workers.max(1)).max(1);

    let mut plan = BalancedPlan::default();
    for (i, segment) in segments.iter().enumerate() {
        if segment.is_empty() {
            continue;
        }
        let pieces: Vec<EncodingRange> = chunked(i, 0, segment.len(), per_worker, i as u32).collect();
        let files: Vec<String> = pieces
            .iter()
            .filter_map(|r| r.file_name(segments))
            .collect();
        if let Some(first) = files.first() {
            plan.concat_lists.push(ConcatList {
                name: format!("{}.lst", first),
                files: files.clone(),
            });
        }
        plan.ranges.extend(pieces);
    }

    info!(
        frames = total,
        workers,
        files = plan.ranges.len(),
        "Planned balanced encode"
    );
    plan
}

/// Unix second shown on frame `frame_index` of a video recorded from
/// `start`.
pub fn timecode(start: i64, frame_index: u64, rate: FrameRate) -> i64 {
    let elapsed = frame_index * u64::from(rate.den) / u64::from(rate.num);
    start + elapsed as i64
}

/// Output name of the timecode overlay for a video: its file name with
/// `.TC.MOV` appended.
pub fn timecode_file_name(video: &VideoInfo) -> String {
    let name = video
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("{:03}-{:03}", video.file_id, video.file_seq));
    format!("{}.TC.MOV", name)
}

//! Video metadata and encoding plans
//!
//! Camera footage arrives as numbered parts (`GX-<id>-<seq>`). Parts of one
//! recording are merged with [`compute_map_segments`], matched against the
//! track by time with [`get_segment_range`], and turned into output files
//! by one of the planners.

mod error;
mod info;
mod matcher;
mod plan;

pub use error::VideoError;
pub use info::{parse_file_name, FrameRate, GpxInfo, SegmentsDocument, VideoInfo, VideoInfoDocument};
pub use matcher::{
    compute_map_segments, compute_map_segments_with_gpx, get_segment_range, load_video_gpx, SegmentRange,
};
pub use plan::{
    plan_balanced, plan_for_videos, plan_per_segment, timecode, timecode_file_name, BalancedPlan, ConcatList,
    EncodingRange, DEFAULT_MAX_CHUNK_SECS,
};

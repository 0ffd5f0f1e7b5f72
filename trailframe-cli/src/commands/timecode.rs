//! timecode command - per-second timestamps for synchronisation footage.

use std::path::Path;

use trailframe::frame::format_local_time;
use trailframe::video::{timecode, timecode_file_name, SegmentsDocument, VideoInfo, VideoInfoDocument};

use crate::error::CliError;

/// Run the timecode command.
///
/// Accepts either a segments document or a video info document. For each
/// video, prints the first frame of every new second.
pub fn run(path: &Path) -> Result<(), CliError> {
    let videos = match SegmentsDocument::load(path) {
        Ok(doc) => doc.segments,
        Err(_) => VideoInfoDocument::load(path)?.video_info,
    };

    for video in &videos {
        print_schedule(video);
    }
    Ok(())
}

fn print_schedule(video: &VideoInfo) {
    println!("{}", timecode_file_name(video));
    let mut last = None;
    for frame in 0..video.frame_count {
        let ts = timecode(video.start, frame, video.frame_rate);
        if last != Some(ts) {
            println!("  frame {:>7}  {}  {}", frame, ts, format_local_time(ts as f64));
            last = Some(ts);
        }
    }
}

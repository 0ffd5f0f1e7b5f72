//! compute-segments command - merge video parts into recordings.

use std::path::{Path, PathBuf};

use trailframe::video::{
    compute_map_segments, compute_map_segments_with_gpx, load_video_gpx, SegmentsDocument, VideoInfoDocument,
};

use crate::error::CliError;
use crate::runner::CliRunner;

/// Run the compute-segments command.
///
/// Timing comes from `gpx` when given, else from the document's
/// `gpx_info`, else from the descriptors themselves.
pub fn run(config: Option<&Path>, video_info: &Path, output: &Path, gpx: &[PathBuf]) -> Result<(), CliError> {
    let runner = CliRunner::new(config)?;
    runner.log_startup("compute-segments");

    let doc = VideoInfoDocument::load(video_info)?;
    let gpx_info = if gpx.is_empty() {
        doc.gpx_info
    } else {
        load_video_gpx(gpx)?
    };

    let segments = if gpx_info.is_empty() {
        compute_map_segments(&doc.video_info)?
    } else {
        compute_map_segments_with_gpx(&doc.video_info, &gpx_info)?
    };

    for s in &segments {
        println!(
            "{:03}: {} frames @ {} fps, start {}, {:.1} s",
            s.file_id,
            s.frame_count,
            s.frame_rate,
            s.start,
            s.duration
        );
    }

    SegmentsDocument { segments }.save(output)?;
    println!("Wrote {}", output.display());
    Ok(())
}

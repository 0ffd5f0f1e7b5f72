//! plan command - print what would be encoded.

use std::path::{Path, PathBuf};

use clap::Args;
use trailframe::render::BatchRunner;
use trailframe::track::Segment;
use trailframe::video::{
    plan_balanced, plan_for_videos, plan_per_segment, BalancedPlan, EncodingRange, SegmentsDocument,
};

use crate::error::CliError;
use crate::runner::CliRunner;

/// How ranges are chosen.
#[derive(Debug, Args)]
pub struct PlanArgs {
    /// Ride GPX files, loaded in path order
    #[arg(long, required = true, num_args = 1..)]
    pub gpx: Vec<PathBuf>,

    /// Segments document from compute-segments; one file per video
    #[arg(long, conflicts_with = "balanced")]
    pub segments: Option<PathBuf>,

    /// Split every segment evenly across the workers
    #[arg(long)]
    pub balanced: bool,
}

/// Builds the ranges selected by `args`.
///
/// Balanced plans also return their concat lists.
pub fn build(
    runner: &CliRunner,
    segments: &[Segment],
    args: &PlanArgs,
    workers: usize,
) -> Result<BalancedPlan, CliError> {
    if let Some(path) = &args.segments {
        let doc = SegmentsDocument::load(path)?;
        let render = &runner.config().render;
        let ranges = plan_for_videos(segments, &doc.segments, render.frame_rate.as_f64(), render.max_chunk_secs);
        return Ok(BalancedPlan {
            ranges,
            concat_lists: Vec::new(),
        });
    }
    if args.balanced {
        return Ok(plan_balanced(segments, workers));
    }
    Ok(BalancedPlan {
        ranges: plan_per_segment(segments),
        concat_lists: Vec::new(),
    })
}

pub fn print_range(range: &EncodingRange, segments: &[Segment]) {
    println!(
        "  {}  segment {} frames {}..{} ({})",
        range.file_name(segments).unwrap_or_else(|| "?".to_string()),
        range.segment_index,
        range.start_frame,
        range.end_frame(),
        range.frame_count
    );
}

/// Run the plan command.
pub fn run(config: Option<&Path>, args: PlanArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(config)?;
    runner.log_startup("plan");

    let segments = runner.load_segments(&args.gpx)?;
    let workers = BatchRunner::new(runner.config().render.workers).workers();
    let plan = build(&runner, &segments, &args, workers)?;

    println!("{} file(s):", plan.ranges.len());
    for range in &plan.ranges {
        print_range(range, &segments);
    }
    for list in &plan.concat_lists {
        println!();
        println!("{}:", list.name);
        print!("{}", list.contents());
    }
    Ok(())
}

//! render command - encode every planned file.

use std::path::{Path, PathBuf};

use clap::Args;
use trailframe::render::{format_progress, EncoderFactory, ManifestEncoderFactory, RenderContext, RenderSettings};
use trailframe::video::ConcatList;

use super::plan::{self, PlanArgs};
use crate::error::CliError;
use crate::runner::{frame_progress, CliRunner};

#[derive(Debug, Args)]
pub struct RenderArgs {
    #[command(flatten)]
    pub plan: PlanArgs,

    /// Directory receiving the output files
    #[arg(long)]
    pub outdir: PathBuf,
}

/// Run the render command.
///
/// Frames are written by the built-in manifest encoder, one JSON line per
/// frame. Failed files are listed at the end and make the command fail.
pub fn run(config: Option<&Path>, args: RenderArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(config)?;
    runner.log_startup("render");
    let cfg = runner.config();

    let segments = runner.load_segments(&args.plan.gpx)?;
    let batch = runner.batch_runner()?;
    let plan = plan::build(&runner, &segments, &args.plan, batch.workers())?;
    if plan.ranges.is_empty() {
        println!("Nothing to encode");
        return Ok(());
    }

    std::fs::create_dir_all(&args.outdir)
        .map_err(|e| CliError::Config(format!("Cannot create {}: {}", args.outdir.display(), e)))?;

    let fps = cfg.render.frame_rate;
    let settings = RenderSettings::new(&args.outdir)
        .with_size(cfg.render.width, cfg.render.height)
        .with_fps(fps);
    let ctx = RenderContext::new(
        runner.open_tile_cache()?,
        segments,
        cfg.zoom.levels.clone(),
        cfg.sync_override(),
        settings,
    )?;

    println!(
        "Encoding {} file(s) with {} worker(s) into {}",
        plan.ranges.len(),
        batch.workers(),
        args.outdir.display()
    );
    let (bar, reporter) = frame_progress(batch.progress(), fps);
    let report = batch.run(&ctx, &plan.ranges, &ManifestEncoderFactory);
    reporter.stop();
    bar.finish_and_clear();
    let report = report?;

    // concat lists name the files with the extension actually written
    let extension = ManifestEncoderFactory.extension();
    for list in &plan.concat_lists {
        let files = list
            .files
            .iter()
            .map(|f| Path::new(f).with_extension(extension).display().to_string())
            .collect();
        let list = ConcatList {
            name: list.name.clone(),
            files,
        };
        println!("Wrote {}", list.write_to(&args.outdir)?.display());
    }

    let stats = ctx.cache().stats();
    println!(
        "Encoded {} file(s), {}",
        report.completed.len(),
        format_progress(report.total_frames(), fps)
    );
    println!(
        "Tiles: {} downloaded, {} from disk, {} failed",
        stats.downloads, stats.disk_hits, stats.failures
    );

    if batch.cancellation().is_cancelled() {
        return Err(CliError::Cancelled);
    }
    if !report.is_success() {
        println!();
        println!("Failed files:");
        for failure in &report.failures {
            println!("  {}: {}", failure.file, failure.error);
        }
        return Err(CliError::Failed {
            failed: report.failures.len(),
            total: plan.ranges.len(),
        });
    }
    Ok(())
}

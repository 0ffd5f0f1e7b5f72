//! prefetch command - warm the tile cache along the track.

use std::path::{Path, PathBuf};

use trailframe::tile::tiles_along;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Run the prefetch command.
///
/// Every configured zoom level is fetched in turn on the worker pool.
pub fn run(config: Option<&Path>, gpx: &[PathBuf]) -> Result<(), CliError> {
    let runner = CliRunner::new(config)?;
    runner.log_startup("prefetch");

    let segments = runner.load_segments(gpx)?;
    let cache = runner.open_tile_cache()?;
    let batch = runner.batch_runner()?;
    let cancellation = batch.cancellation();

    let mut failed = 0;
    let mut total = 0;
    for level in &runner.config().zoom.levels {
        if cancellation.is_cancelled() {
            return Err(CliError::Cancelled);
        }
        let keys = tiles_along(&segments, level.zoom);
        let report = batch.install(|| cache.prefetch(&keys, &cancellation))?;
        println!(
            "Zoom {:2}: {} tiles, {} loaded, {} failed",
            level.zoom, report.requested, report.loaded, report.failed
        );
        failed += report.failed;
        total += report.requested;
    }

    let stats = cache.stats();
    println!(
        "Tiles: {} downloaded, {} already on disk",
        stats.downloads, stats.disk_hits
    );
    if cancellation.is_cancelled() {
        return Err(CliError::Cancelled);
    }
    if failed > 0 {
        return Err(CliError::Failed { failed, total });
    }
    Ok(())
}

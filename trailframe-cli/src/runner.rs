//! Shared start-up for commands: configuration, logging and Ctrl+C.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;
use tracing::info;
use trailframe::config::ConfigFile;
use trailframe::logging::{self, WorkerGuard};
use trailframe::render::{format_progress, BatchRunner, ProgressCounter, ProgressReporter};
use trailframe::tile::HttpTileCache;
use trailframe::track::{Segment, TrackLoader};
use trailframe::video::FrameRate;

use crate::error::CliError;

/// Loaded configuration plus the logging guard, kept for the whole run.
pub struct CliRunner {
    config: ConfigFile,
    _log_guard: Option<WorkerGuard>,
}

impl CliRunner {
    /// Loads the configuration (`path` or the default file) and installs
    /// logging.
    pub fn new(path: Option<&Path>) -> Result<Self, CliError> {
        let config = match path {
            Some(p) => ConfigFile::load_from(p)?,
            None => ConfigFile::load()?,
        };
        let guard = logging::init(&config.logging).map_err(|e| CliError::Logging(e.to_string()))?;
        Ok(Self {
            config,
            _log_guard: guard,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn log_startup(&self, command: &str) {
        info!(
            command,
            version = env!("CARGO_PKG_VERSION"),
            tiles = %self.config.tiles.directory.display(),
            "trailframe starting"
        );
    }

    /// Loads and resamples the ride tracks to the output frame rate.
    pub fn load_segments(&self, paths: &[impl AsRef<Path>]) -> Result<Vec<Segment>, CliError> {
        let loader = TrackLoader::new(self.config.loader_config());
        let segments = loader.load_segments(&trip_order(paths));
        if segments.iter().all(Segment::is_empty) {
            return Err(CliError::NoTrackData);
        }
        println!(
            "Loaded {} segment(s), {} frames",
            segments.len(),
            segments.iter().map(Segment::len).sum::<usize>()
        );
        Ok(segments)
    }

    pub fn open_tile_cache(&self) -> Result<Arc<HttpTileCache>, CliError> {
        let tiles = &self.config.tiles;
        let cache = HttpTileCache::open_http(&tiles.directory, &tiles.url, self.config.tile_timeout())?;
        Ok(Arc::new(cache))
    }

    /// Worker pool cancelled by Ctrl+C.
    pub fn batch_runner(&self) -> Result<BatchRunner, CliError> {
        let cancellation = CancellationToken::new();
        let on_signal = cancellation.clone();
        ctrlc::set_handler(move || {
            eprintln!();
            eprintln!("Received interrupt, finishing current frames...");
            on_signal.cancel();
        })
        .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

        Ok(BatchRunner::new(self.config.render.workers).with_cancellation(cancellation))
    }
}

/// Ride files sorted by path, so `day2.gpx day1.gpx` still loads day 1
/// first and distance accumulates forward.
pub fn trip_order(paths: &[impl AsRef<Path>]) -> Vec<PathBuf> {
    let mut sorted: Vec<PathBuf> = paths.iter().map(|p| p.as_ref().to_path_buf()).collect();
    sorted.sort();
    sorted
}

/// Spinner showing the frame count and the video time it amounts to.
pub fn frame_progress(counter: Arc<ProgressCounter>, fps: FrameRate) -> (ProgressBar, ProgressReporter) {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.enable_steady_tick(Duration::from_millis(200));

    let shown = bar.clone();
    let reporter = ProgressReporter::start_default(
        counter,
        Box::new(move |frames| shown.set_message(format_progress(frames, fps))),
    );
    (bar, reporter)
}

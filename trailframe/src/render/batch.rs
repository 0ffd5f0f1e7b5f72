//! Parallel encoding of a whole plan.
//!
//! Files are independent: each worker owns its map views and zoom schedule
//! and only the tile cache is shared. A failed file is recorded and the
//! batch carries on with the rest.

use std::path::PathBuf;
use std::sync::Arc;

use rayon::prelude::*;
use rayon::ThreadPool;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::{EncoderFactory, ProgressCounter, RenderContext, RenderError};
use crate::tile::TileSource;
use crate::video::EncodingRange;

/// An output file that could not be produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    pub file: String,
    pub error: String,
}

/// Outcome of a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Written files with their frame counts.
    pub completed: Vec<(PathBuf, u64)>,
    pub failures: Vec<BatchFailure>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn total_frames(&self) -> u64 {
        self.completed.iter().map(|(_, n)| n).sum()
    }
}

/// Bounded worker pool for encoding and prefetching.
#[derive(Debug, Clone)]
pub struct BatchRunner {
    workers: usize,
    cancellation: CancellationToken,
    progress: Arc<ProgressCounter>,
}

impl BatchRunner {
    /// `workers == 0` uses one worker per CPU.
    pub fn new(workers: usize) -> Self {
        Self {
            workers,
            cancellation: CancellationToken::new(),
            progress: Arc::new(ProgressCounter::new()),
        }
    }

    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub fn with_progress(mut self, progress: Arc<ProgressCounter>) -> Self {
        self.progress = progress;
        self
    }

    pub fn cancellation(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    pub fn progress(&self) -> Arc<ProgressCounter> {
        Arc::clone(&self.progress)
    }

    /// Number of threads the pool will run.
    pub fn workers(&self) -> usize {
        if self.workers == 0 {
            rayon::current_num_threads()
        } else {
            self.workers
        }
    }

    /// Runs `op` inside a dedicated pool of [`BatchRunner::workers`]
    /// threads.
    pub fn install<R, F>(&self, op: F) -> Result<R, RenderError>
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        Ok(self.pool()?.install(op))
    }

    fn pool(&self) -> Result<ThreadPool, RenderError> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers())
            .thread_name(|i| format!("trailframe-worker-{}", i))
            .build()
            .map_err(|e| RenderError::Pool(e.to_string()))
    }

    /// Encodes every range. Only a pool start-up failure is an error;
    /// per-file failures are collected in the report.
    pub fn run<S: TileSource>(
        &self,
        ctx: &RenderContext<S>,
        ranges: &[EncodingRange],
        factory: &dyn EncoderFactory,
    ) -> Result<BatchReport, RenderError> {
        info!(files = ranges.len(), workers = self.workers(), "Starting batch");

        let results: Vec<(String, Result<(PathBuf, u64), RenderError>)> = self.install(|| {
            ranges
                .par_iter()
                .map(|range| {
                    let name = ctx
                        .output_path(range, factory.extension())
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| format!("{:03}-{:03}", range.file_id, range.chunk));
                    let result = ctx.encode_range(range, factory, &self.cancellation, &self.progress);
                    (name, result)
                })
                .collect()
        })?;

        let mut report = BatchReport::default();
        for (file, result) in results {
            match result {
                Ok(done) => report.completed.push(done),
                Err(e) => {
                    error!(file = %file, error = %e, "Encoding failed");
                    report.failures.push(BatchFailure {
                        file,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            completed = report.completed.len(),
            failed = report.failures.len(),
            frames = report.total_frames(),
            "Batch finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{NeverOverride, ZoomLevel};
    use crate::render::{ManifestEncoderFactory, RenderSettings};
    use crate::tile::source::tests::BlankSource;
    use crate::tile::TileCache;
    use crate::track::{Segment, TrackPoint};
    use crate::video::{plan_balanced, FrameRate};
    use tempfile::TempDir;

    fn context(dir: &TempDir, output_exists: bool) -> RenderContext<BlankSource> {
        let mut a = Segment::new(0.0, 0.0);
        let mut b = Segment::new(0.0, 0.0);
        for i in 0..20 {
            a.add_point(TrackPoint::new(1_600_000_000.0 + f64::from(i), 48.0, 2.0 + f64::from(i) * 1e-4));
            b.add_point(TrackPoint::new(1_600_100_000.0 + f64::from(i), 48.1, 2.1 + f64::from(i) * 1e-4));
        }
        let out = dir.path().join("out");
        if output_exists {
            std::fs::create_dir_all(&out).unwrap();
        }
        let cache = Arc::new(TileCache::new(dir.path().join("tiles"), BlankSource::new(256)).unwrap());
        let settings = RenderSettings::new(out)
            .with_size(256, 256)
            .with_fps(FrameRate::new(1, 1).unwrap());
        RenderContext::new(cache, vec![a, b], vec![ZoomLevel::new(12, 5)], NeverOverride, settings).unwrap()
    }

    #[test]
    fn test_batch_encodes_all_ranges() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir, true);
        let plan = plan_balanced(ctx.segments(), 4);
        let runner = BatchRunner::new(2);

        let report = runner.run(&ctx, &plan.ranges, &ManifestEncoderFactory).unwrap();

        assert!(report.is_success());
        assert_eq!(report.completed.len(), plan.ranges.len());
        assert_eq!(report.total_frames(), 40);
        assert_eq!(runner.progress().frames(), 40);
        assert!(report.completed.iter().all(|(p, _)| p.exists()));
    }

    #[test]
    fn test_batch_collects_failures() {
        let dir = TempDir::new().unwrap();
        // the output directory is missing, so every file fails to open
        let ctx = context(&dir, false);
        let plan = plan_balanced(ctx.segments(), 2);

        let report = BatchRunner::new(2)
            .run(&ctx, &plan.ranges, &ManifestEncoderFactory)
            .unwrap();

        assert!(!report.is_success());
        assert_eq!(report.failures.len(), plan.ranges.len());
        assert!(report.completed.is_empty());
    }

    #[test]
    fn test_zero_workers_means_all_cpus() {
        assert_eq!(BatchRunner::new(0).workers(), rayon::current_num_threads());
        assert_eq!(BatchRunner::new(3).workers(), 3);
    }
}

//! Frame progress across all encoding workers.
//!
//! Workers bump a shared atomic counter; a reporter thread polls it and
//! hands the total to a callback until it is stopped.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::video::FrameRate;

/// Called with the number of frames processed so far.
pub type ProgressCallback = Box<dyn Fn(u64) + Send + Sync>;

/// Lock-free frame counter shared by all workers.
#[derive(Debug, Default)]
pub struct ProgressCounter {
    frames: AtomicU64,
    done: AtomicBool,
}

impl ProgressCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_frames(&self, n: u64) {
        self.frames.fetch_add(n, Ordering::Relaxed);
    }

    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    pub fn signal_done(&self) {
        self.done.store(true, Ordering::SeqCst);
    }

    pub fn is_done(&self) -> bool {
        self.done.load(Ordering::SeqCst)
    }
}

/// `"<frames> frames - MM:SS"`, the video time those frames amount to.
pub fn format_progress(frames: u64, rate: FrameRate) -> String {
    let total_secs = frames * u64::from(rate.den) / u64::from(rate.num);
    format!("{} frames - {:02}:{:02}", frames, total_secs / 60, total_secs % 60)
}

/// Background thread reporting progress at a fixed interval.
///
/// Stops, after one final report, when the counter is signalled done or
/// the reporter is dropped.
pub struct ProgressReporter {
    handle: Option<JoinHandle<()>>,
    counter: Arc<ProgressCounter>,
}

impl ProgressReporter {
    pub fn start(counter: Arc<ProgressCounter>, callback: ProgressCallback, poll_interval: Duration) -> Self {
        let polled = Arc::clone(&counter);
        let handle = thread::spawn(move || {
            while !polled.is_done() {
                callback(polled.frames());
                thread::sleep(poll_interval);
            }
            callback(polled.frames());
        });

        Self {
            handle: Some(handle),
            counter,
        }
    }

    /// Reports once per second.
    pub fn start_default(counter: Arc<ProgressCounter>, callback: ProgressCallback) -> Self {
        Self::start(counter, callback, Duration::from_secs(1))
    }

    /// Stops the thread and waits for its final report.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.counter.signal_done();
        if let Some(handle) = self.handle.take() {
            handle.join().ok();
        }
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        self.shutdown();
    }
}

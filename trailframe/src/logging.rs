//! Logging setup.
//!
//! Logs go to stderr and, when a file is configured, to that file as well
//! through a non-blocking writer. `RUST_LOG` takes precedence over the
//! configured level.

use std::io;
use std::path::Path;

pub use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;

/// Builds the filter: `RUST_LOG` if set and valid, otherwise `level`.
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Installs the global subscriber.
///
/// The returned guard flushes the log file when dropped and must be kept
/// alive for the lifetime of the program. Returns `Ok(None)` when no file
/// is configured. Installing twice is an error reported by
/// `tracing_subscriber`.
///
/// # Arguments
///
/// * `config` - Level and optional log file
pub fn init(config: &LoggingConfig) -> io::Result<Option<WorkerGuard>> {
    let stderr_layer = fmt::layer()
        .with_timer(LocalTime::rfc_3339())
        .with_writer(io::stderr);

    let (file_layer, guard) = match &config.file {
        Some(path) => {
            let file = open_log_file(path)?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            let layer = fmt::layer()
                .with_timer(LocalTime::rfc_3339())
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter(&config.level))
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;

    Ok(guard)
}

fn open_log_file(path: &Path) -> io::Result<std::fs::File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::OpenOptions::new().create(true).append(true).open(path)
}

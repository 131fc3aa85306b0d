//! Logging set-up for one run.
//!
//! Console output is always on; a log file is added when requested. The file
//! rotates by size and keeps a fixed number of backups next to it
//! (`albumsync.log.1`, `albumsync.log.2`). The returned [`LogGuard`] must
//! live until the end of `main` so the file is flushed on exit.

use albumsync_core::{SyncError, SyncResult};
use file_rotate::compression::Compression;
use file_rotate::suffix::AppendCount;
use file_rotate::{ContentLimit, FileRotate};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVE: &str = "info";

/// Size at which the log file is rotated.
pub const LOG_FILE_MAX_BYTES: usize = 250 * 1024;
/// Rotated files kept besides the live one.
pub const LOG_FILE_BACKUPS: usize = 2;

/// Size-rotated log file shared between the file layer and the guard.
#[derive(Clone)]
pub struct RotatingLog(Arc<Mutex<FileRotate<AppendCount>>>);

impl RotatingLog {
    /// Open `path` for appending, rotating once it reaches `max_bytes`.
    pub fn open(path: &Path, max_bytes: usize, backups: usize) -> SyncResult<Self> {
        // FileRotate creates missing parents and opens lazily, so check the
        // path up front to fail the run with a clear message.
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| SyncError::Config(format!("cannot open log file {}: {e}", path.display())))?;

        let file = FileRotate::new(
            path,
            AppendCount::new(backups),
            ContentLimit::Bytes(max_bytes),
            Compression::None,
            #[cfg(unix)]
            None,
        );
        Ok(Self(Arc::new(Mutex::new(file))))
    }
}

impl Write for RotatingLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))?
            .write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))?
            .flush()
    }
}

/// Keeps the log file open for the run and flushes it on drop.
#[must_use = "dropping the guard early stops flushing the log file"]
pub struct LogGuard {
    file: Option<RotatingLog>,
}

impl Drop for LogGuard {
    fn drop(&mut self) {
        if let Some(file) = &mut self.file {
            let _ = file.flush();
        }
    }
}

/// `--log-level` wins, then `RUST_LOG`, then `info`.
pub fn env_filter(level: Option<&str>) -> SyncResult<EnvFilter> {
    match level {
        Some(directive) => EnvFilter::try_new(directive)
            .map_err(|e| SyncError::Config(format!("invalid log level {directive:?}: {e}"))),
        None => Ok(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))),
    }
}

/// Install the global subscriber. Call once, before anything logs.
pub fn init(level: Option<&str>, log_file: Option<&Path>) -> SyncResult<LogGuard> {
    let filter = env_filter(level)?;

    let file = log_file
        .map(|path| RotatingLog::open(path, LOG_FILE_MAX_BYTES, LOG_FILE_BACKUPS))
        .transpose()?;

    let console = tracing_subscriber::fmt::layer()
        .without_time()
        .with_target(false)
        .with_writer(io::stderr);

    let file_layer = file.clone().map(|f| {
        tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_target(false)
            .with_writer(move || f.clone())
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .try_init()
        .map_err(|e| SyncError::Config(format!("logging already initialized: {e}")))?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "albumsync starting");
    Ok(LogGuard { file })
}

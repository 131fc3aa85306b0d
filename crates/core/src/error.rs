//! Centralized error types for the albumsync workspace.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error enum. Variants map to subsystems.
///
/// Only errors that abort a run travel through this type; per-candidate
/// remote failures are recovered inside the orchestrator.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Library root {path:?} is not usable: {source}")]
    LibraryRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid exclusion pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Sink error: {0}")]
    Sink(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type SyncResult<T> = Result<T, SyncError>;

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::repository::RepositoryError;

/// Errors surfaced by a sync pass.
///
/// Folder and file level failures are reported through events; only
/// persistence and setup failures are returned to the caller.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Failed to list directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to read an entry of {path}: {source}")]
    DirEntry {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Catalog persistence failed: {0}")]
    Repository(#[from] RepositoryError),
    #[error("Invalid sync configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Sync worker thread panicked")]
    WorkerPanicked,
}

//! Catalog index: the `Repository` port consumed by the sync core and its
//! SQLite-backed adapter.

mod backup;
mod catalog_repository;
pub mod store;
mod thumbnails;

use std::path::{Path, PathBuf};

use thiserror::Error;
use time::Date;

use crate::catalog::{Asset, Folder};

pub use backup::{
    BACKUP_DIR_NAME, BackupManifest, BackupStorage, capture_local_offset, format_date, parse_date,
    today,
};
pub use catalog_repository::CatalogRepository;
pub use store::{CatalogStore, DB_FILE_NAME};

/// Errors raised while persisting, backing up or restoring the catalog.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Catalog database error: {0}")]
    Sql(#[from] rusqlite::Error),
    #[error("Catalog database is busy, please retry")]
    Busy,
    #[error("Could not create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Backup archive {path} is invalid: {message}")]
    Archive { path: PathBuf, message: String },
    #[error("Backup manifest is invalid: {0}")]
    Manifest(#[from] serde_json::Error),
    #[error("No backup exists for {0}")]
    MissingBackup(String),
    #[error("Invalid backup date '{text}': {message}")]
    InvalidDate { text: String, message: String },
    #[error("Failed to format backup date: {0}")]
    DateFormat(#[from] time::error::Format),
}

/// In-memory index of folders and assets plus the persistence and backup
/// primitives the sync core needs.
///
/// Lookups and mutations work on the in-memory state and only mark it dirty;
/// nothing reaches disk until [`Repository::save_catalog`].
pub trait Repository {
    fn folder_by_path(&self, path: &Path) -> Option<Folder>;

    /// Every known folder, ordered by path.
    fn folders(&self) -> Vec<Folder>;

    /// Return the folder for `path`, creating it when unknown.
    fn add_folder(&mut self, path: &Path) -> Folder;

    /// Remove a folder together with its assets and thumbnails.
    fn delete_folder(&mut self, folder: &Folder);

    /// Assets catalogued directly inside `path`, ordered by file name.
    fn cataloged_assets_by_path(&self, path: &Path) -> Vec<Asset>;

    fn cataloged_assets(&self) -> Vec<Asset>;

    fn add_asset(&mut self, asset: Asset, thumbnail: Vec<u8>);

    /// Replace an existing asset; `None` keeps the cached thumbnail.
    fn update_asset(&mut self, asset: Asset, thumbnail: Option<Vec<u8>>);

    fn delete_asset(&mut self, folder: &Folder, file_name: &str) -> Option<Asset>;

    fn has_changes(&self) -> bool;

    fn save_catalog(&mut self) -> Result<(), RepositoryError>;

    /// True when a backup dated `date` exists.
    fn backup_exists(&self, date: Date) -> bool;

    fn write_backup(&mut self, date: Date) -> Result<(), RepositoryError>;

    /// True when the backup dated `date` does not reflect the last saved catalog.
    fn backup_is_out_of_date(&self, date: Date) -> bool;
}

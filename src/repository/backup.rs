//! Dated zip backups of the catalog database.
//!
//! Each archive is named `YYYYMMDD.zip` and holds a compacted copy of the
//! database plus a JSON manifest recording the revision it was taken at.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::{Date, OffsetDateTime, UtcOffset};

use super::RepositoryError;

/// Directory under the catalog directory that holds backup archives.
pub const BACKUP_DIR_NAME: &str = "backups";
const CATALOG_ENTRY: &str = "catalog.db";
const MANIFEST_ENTRY: &str = "manifest.json";
const DATE_FORMAT: &[time::format_description::FormatItem<'static>] =
    format_description!("[year][month][day]");

/// Summary stored next to the database inside each archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupManifest {
    pub revision: u64,
    pub folders: usize,
    pub assets: usize,
    /// Epoch seconds when the archive was written.
    pub created_at: i64,
}

/// Reads and writes dated backup archives in one directory.
#[derive(Debug, Clone)]
pub struct BackupStorage {
    dir: PathBuf,
}

impl BackupStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Archive path for the given calendar date.
    pub fn archive_path(&self, date: Date) -> Result<PathBuf, RepositoryError> {
        Ok(self.dir.join(format!("{}.zip", format_date(date)?)))
    }

    pub fn exists_for(&self, date: Date) -> Result<bool, RepositoryError> {
        Ok(self.archive_path(date)?.is_file())
    }

    /// Write the archive for `date`, replacing any archive already there.
    pub fn write(
        &self,
        date: Date,
        database: &Path,
        manifest: &BackupManifest,
    ) -> Result<PathBuf, RepositoryError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| RepositoryError::CreateDir {
            path: self.dir.clone(),
            source,
        })?;
        let target = self.archive_path(date)?;
        let tmp = tempfile::NamedTempFile::new_in(&self.dir).map_err(io_error(&self.dir))?;
        let mut zip = zip::ZipWriter::new(tmp.as_file());
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);

        zip.start_file(CATALOG_ENTRY, options)
            .map_err(|err| archive_error(&target, err))?;
        let mut db_file = File::open(database).map_err(io_error(database))?;
        std::io::copy(&mut db_file, &mut zip).map_err(io_error(&target))?;

        zip.start_file(MANIFEST_ENTRY, options)
            .map_err(|err| archive_error(&target, err))?;
        let manifest_bytes = serde_json::to_vec_pretty(manifest)?;
        zip.write_all(&manifest_bytes).map_err(io_error(&target))?;
        zip.finish().map_err(|err| archive_error(&target, err))?;

        tmp.as_file().sync_all().map_err(io_error(&target))?;
        tmp.persist(&target)
            .map_err(|err| RepositoryError::Io {
                path: target.clone(),
                source: err.error,
            })?;
        Ok(target)
    }

    /// Read the manifest of the archive for `date`, or `None` when no archive exists.
    pub fn read_manifest(&self, date: Date) -> Result<Option<BackupManifest>, RepositoryError> {
        let path = self.archive_path(date)?;
        if !path.is_file() {
            return Ok(None);
        }
        let mut archive = open_archive(&path)?;
        let entry = archive
            .by_name(MANIFEST_ENTRY)
            .map_err(|err| archive_error(&path, err))?;
        let manifest = serde_json::from_reader(entry)?;
        Ok(Some(manifest))
    }

    /// Copy the database stored in the archive for `date` to `dest`.
    pub fn extract_catalog(&self, date: Date, dest: &Path) -> Result<(), RepositoryError> {
        let path = self.archive_path(date)?;
        if !path.is_file() {
            return Err(RepositoryError::MissingBackup(format_date(date)?));
        }
        let mut archive = open_archive(&path)?;
        let mut entry = archive
            .by_name(CATALOG_ENTRY)
            .map_err(|err| archive_error(&path, err))?;
        let mut out = File::create(dest).map_err(io_error(dest))?;
        std::io::copy(&mut entry, &mut out).map_err(io_error(dest))?;
        out.sync_all().map_err(io_error(dest))?;
        Ok(())
    }

    /// Dates with an archive on disk, oldest first. Unrelated files are ignored.
    pub fn list_dates(&self) -> Result<Vec<Date>, RepositoryError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(RepositoryError::Io {
                    path: self.dir.clone(),
                    source,
                });
            }
        };
        let mut dates = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("zip") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            if let Ok(date) = parse_date(stem) {
                dates.push(date);
            }
        }
        dates.sort();
        Ok(dates)
    }
}

static LOCAL_OFFSET: OnceLock<UtcOffset> = OnceLock::new();

/// Read and remember the local UTC offset, falling back to UTC.
///
/// The offset is only readable while the process is single-threaded, so call
/// this from `main` before logging or any worker thread starts.
pub fn capture_local_offset() -> UtcOffset {
    *LOCAL_OFFSET.get_or_init(|| UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC))
}

/// Current calendar date at the captured local offset.
pub fn today() -> Date {
    date_at(OffsetDateTime::now_utc(), capture_local_offset())
}

pub(super) fn date_at(now: OffsetDateTime, offset: UtcOffset) -> Date {
    now.to_offset(offset).date()
}

/// Format a date the way archive names are written (`YYYYMMDD`).
pub fn format_date(date: Date) -> Result<String, RepositoryError> {
    Ok(date.format(DATE_FORMAT)?)
}

/// Parse a `YYYYMMDD` archive stem.
pub fn parse_date(text: &str) -> Result<Date, RepositoryError> {
    Date::parse(text, DATE_FORMAT).map_err(|err| RepositoryError::InvalidDate {
        text: text.to_string(),
        message: err.to_string(),
    })
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> RepositoryError + use<> {
    let path = path.to_path_buf();
    move |source| RepositoryError::Io { path, source }
}

fn open_archive(path: &Path) -> Result<zip::ZipArchive<File>, RepositoryError> {
    let file = File::open(path).map_err(io_error(path))?;
    zip::ZipArchive::new(file).map_err(|err| archive_error(path, err))
}

fn archive_error(path: &Path, err: zip::result::ZipError) -> RepositoryError {
    RepositoryError::Archive {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

use std::path::{Component, Path, PathBuf};

use super::super::RepositoryError;

/// Translate rusqlite errors into friendlier RepositoryError variants.
pub(crate) fn map_sql_error(err: rusqlite::Error) -> RepositoryError {
    match err {
        rusqlite::Error::SqliteFailure(sql_err, _)
            if sql_err.extended_code == rusqlite::ffi::SQLITE_BUSY =>
        {
            RepositoryError::Busy
        }
        other => RepositoryError::Sql(other),
    }
}

/// Normalize an absolute folder path for stable storage and lookup.
///
/// Drops `.` components and trailing separators; `..` is kept verbatim since
/// resolving it would require touching the filesystem.
pub fn normalize_folder_path(path: &Path) -> PathBuf {
    let mut cleaned = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            other => cleaned.push(other.as_os_str()),
        }
    }
    cleaned
}

pub(super) fn path_to_db(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

pub(super) fn create_parent_if_needed(path: &Path) -> Result<(), RepositoryError> {
    if let Some(parent) = path.parent()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent).map_err(|source| RepositoryError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_drops_curdir_and_trailing_separator() {
        let normalized = normalize_folder_path(Path::new("/photos/./2024/"));
        assert_eq!(normalized, PathBuf::from("/photos/2024"));
    }

    #[test]
    fn normalize_keeps_plain_paths_unchanged() {
        let path = Path::new("/photos/holiday");
        assert_eq!(normalize_folder_path(path), path.to_path_buf());
    }
}

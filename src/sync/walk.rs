use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::catalog::{FileFacts, facts_from_metadata, is_supported_image, is_supported_video};

use super::errors::SyncError;

/// Image file found directly inside a folder.
#[derive(Debug, Clone)]
pub(super) struct DiskFile {
    pub(super) name: String,
    pub(super) path: PathBuf,
    /// `None` when the file metadata could not be read.
    pub(super) facts: Option<FileFacts>,
}

/// Non-recursive view of one directory.
#[derive(Debug, Default)]
pub(super) struct DirListing {
    /// Supported images, ordered by name.
    pub(super) images: Vec<DiskFile>,
    /// Supported videos, ordered by path.
    pub(super) videos: Vec<PathBuf>,
    /// Every subdirectory on disk, ordered by path, excluded ones included.
    pub(super) subdirs: Vec<PathBuf>,
}

/// List the images, videos and subdirectories directly inside `dir`.
///
/// Symlinks are skipped. Failing to open the directory is an error; unreadable
/// individual entries are logged and skipped.
pub(super) fn list_dir(dir: &Path) -> Result<DirListing, SyncError> {
    let entries = fs::read_dir(dir).map_err(|source| SyncError::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut listing = DirListing::default();
    for entry_result in entries {
        let entry = entry_result.map_err(|source| SyncError::DirEntry {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        let file_type = match entry.file_type() {
            Ok(file_type) => file_type,
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "Failed to read file type during sync"
                );
                continue;
            }
        };
        if file_type.is_symlink() {
            continue;
        }
        if file_type.is_dir() {
            listing.subdirs.push(path);
            continue;
        }
        if !file_type.is_file() {
            continue;
        }
        if is_supported_image(&path) {
            let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
                warn!(path = %path.display(), "Skipping file with non UTF-8 name");
                continue;
            };
            let facts = match entry.metadata().and_then(|meta| facts_from_metadata(&meta)) {
                Ok(facts) => Some(facts),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "Failed to read file metadata");
                    None
                }
            };
            listing.images.push(DiskFile {
                name: name.to_string(),
                path: path.clone(),
                facts,
            });
        } else if is_supported_video(&path) {
            listing.videos.push(path);
        }
    }
    listing.images.sort_by(|a, b| a.name.cmp(&b.name));
    listing.videos.sort();
    listing.subdirs.sort();
    Ok(listing)
}

/// Depth-first walk yielding folders in pre-order, children in name order.
///
/// Directories matching `is_excluded` are neither yielded nor descended into.
pub(super) struct TreeWalk<F> {
    stack: Vec<PathBuf>,
    is_excluded: F,
}

impl<F> TreeWalk<F>
where
    F: Fn(&Path) -> bool,
{
    pub(super) fn new(root: &Path, is_excluded: F) -> Self {
        Self {
            stack: vec![root.to_path_buf()],
            is_excluded,
        }
    }

    pub(super) fn next_dir(&mut self) -> Option<PathBuf> {
        self.stack.pop()
    }

    /// Queue the subdirectories of the folder just visited.
    pub(super) fn push_children(&mut self, subdirs: &[PathBuf]) {
        for dir in subdirs.iter().rev() {
            if (self.is_excluded)(dir) {
                continue;
            }
            self.stack.push(dir.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn listing_separates_images_videos_and_dirs() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("b.JPG"), b"x").unwrap();
        std::fs::write(dir.path().join("a.png"), b"x").unwrap();
        std::fs::write(dir.path().join("clip.mp4"), b"x").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        let listing = list_dir(dir.path()).unwrap();
        let names: Vec<&str> = listing.images.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a.png", "b.JPG"]);
        assert!(listing.images.iter().all(|f| f.facts.is_some()));
        assert_eq!(listing.videos, vec![dir.path().join("clip.mp4")]);
        assert_eq!(listing.subdirs, vec![dir.path().join("sub")]);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempdir().unwrap();
        let err = list_dir(&dir.path().join("gone")).unwrap_err();
        assert!(matches!(err, SyncError::ReadDir { .. }));
    }

    #[test]
    fn walk_is_preorder_in_name_order_and_honours_exclusions() {
        let root = PathBuf::from("/r");
        let skip = root.join("b");
        let mut walk = TreeWalk::new(&root, |path: &Path| path == skip);
        let mut visited = Vec::new();
        while let Some(dir) = walk.next_dir() {
            let children: Vec<PathBuf> = match dir.to_str() {
                Some("/r") => vec![root.join("a"), root.join("b"), root.join("c")],
                Some("/r/a") => vec![root.join("a/x")],
                _ => Vec::new(),
            };
            walk.push_children(&children);
            visited.push(dir);
        }
        assert_eq!(
            visited,
            vec![
                PathBuf::from("/r"),
                PathBuf::from("/r/a"),
                PathBuf::from("/r/a/x"),
                PathBuf::from("/r/c"),
            ]
        );
    }
}

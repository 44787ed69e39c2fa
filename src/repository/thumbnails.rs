use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// In-memory thumbnail bytes keyed by folder path then file name.
///
/// Every mutation is journaled so the next save writes or deletes exactly the
/// rows that changed.
#[derive(Debug, Default)]
pub(crate) struct ThumbnailCache {
    entries: HashMap<PathBuf, HashMap<String, Vec<u8>>>,
    dirty: HashSet<(PathBuf, String)>,
}

impl ThumbnailCache {
    pub(crate) fn insert(&mut self, folder: &Path, file_name: &str, bytes: Vec<u8>) {
        self.entries
            .entry(folder.to_path_buf())
            .or_default()
            .insert(file_name.to_string(), bytes);
        self.dirty.insert((folder.to_path_buf(), file_name.to_string()));
    }

    /// Cache bytes read back from storage without marking them for writing.
    pub(crate) fn remember(&mut self, folder: &Path, file_name: &str, bytes: Vec<u8>) {
        self.entries
            .entry(folder.to_path_buf())
            .or_default()
            .insert(file_name.to_string(), bytes);
    }

    pub(crate) fn get(&self, folder: &Path, file_name: &str) -> Option<&[u8]> {
        self.entries
            .get(folder)
            .and_then(|names| names.get(file_name))
            .map(Vec::as_slice)
    }

    /// Drop one thumbnail; an emptied folder map is pruned.
    pub(crate) fn remove(&mut self, folder: &Path, file_name: &str) {
        if let Some(names) = self.entries.get_mut(folder) {
            names.remove(file_name);
            if names.is_empty() {
                self.entries.remove(folder);
            }
        }
        self.dirty.insert((folder.to_path_buf(), file_name.to_string()));
    }

    /// Forget every thumbnail of a folder. Storage rows go away with the folder row.
    pub(crate) fn remove_folder(&mut self, folder: &Path) {
        self.entries.remove(folder);
        self.dirty.retain(|(path, _)| path != folder);
    }

    /// Entries changed since the last save, in path then name order.
    pub(crate) fn dirty_entries(&self) -> Vec<(PathBuf, String)> {
        let mut dirty: Vec<_> = self.dirty.iter().cloned().collect();
        dirty.sort();
        dirty
    }

    pub(crate) fn clear_dirty(&mut self) {
        self.dirty.clear();
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.dirty.clear();
    }

    #[cfg(test)]
    pub(crate) fn folder_count(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub(crate) fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removing_last_entry_prunes_folder_map() {
        let mut cache = ThumbnailCache::default();
        let folder = Path::new("/photos");
        cache.insert(folder, "a.jpg", vec![1]);
        cache.insert(folder, "b.jpg", vec![2]);
        assert_eq!(cache.folder_count(), 1);

        cache.remove(folder, "a.jpg");
        assert_eq!(cache.folder_count(), 1);
        cache.remove(folder, "b.jpg");
        assert_eq!(cache.folder_count(), 0);
        assert!(cache.get(folder, "b.jpg").is_none());
    }

    #[test]
    fn journal_tracks_inserts_and_removals_until_cleared() {
        let mut cache = ThumbnailCache::default();
        let folder = Path::new("/photos");
        cache.insert(folder, "a.jpg", vec![1]);
        cache.remove(folder, "b.jpg");
        cache.remember(folder, "c.jpg", vec![3]);

        let dirty = cache.dirty_entries();
        assert_eq!(
            dirty,
            vec![
                (folder.to_path_buf(), "a.jpg".to_string()),
                (folder.to_path_buf(), "b.jpg".to_string()),
            ]
        );
        cache.clear_dirty();
        assert!(!cache.is_dirty());
        assert_eq!(cache.get(folder, "c.jpg"), Some(&[3u8][..]));
    }

    #[test]
    fn removing_folder_drops_its_entries_and_journal() {
        let mut cache = ThumbnailCache::default();
        cache.insert(Path::new("/photos/a"), "x.jpg", vec![1]);
        cache.insert(Path::new("/photos/b"), "y.jpg", vec![2]);
        cache.remove_folder(Path::new("/photos/a"));

        assert_eq!(cache.folder_count(), 1);
        assert_eq!(
            cache.dirty_entries(),
            vec![(PathBuf::from("/photos/b"), "y.jpg".to_string())]
        );
    }
}

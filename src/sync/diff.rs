use std::collections::{HashMap, HashSet};

use crate::catalog::{Asset, is_same_fingerprint};

use super::walk::DiskFile;

/// Work found for one folder by comparing disk against the catalog.
#[derive(Debug, Default)]
pub(super) struct FolderDiff {
    /// Catalogued assets whose file is gone, ordered by name.
    pub(super) deleted: Vec<Asset>,
    /// Files to create or update, ordered by name.
    pub(super) pending: Vec<PendingAsset>,
}

#[derive(Debug)]
pub(super) struct PendingAsset {
    pub(super) file: DiskFile,
    /// Present when the file is already catalogued and has changed.
    pub(super) previous: Option<Asset>,
}

impl PendingAsset {
    pub(super) fn is_update(&self) -> bool {
        self.previous.is_some()
    }
}

pub(super) fn diff_folder(catalogued: Vec<Asset>, on_disk: &[DiskFile]) -> FolderDiff {
    let on_disk_names: HashSet<&str> = on_disk.iter().map(|file| file.name.as_str()).collect();
    let mut by_name: HashMap<String, Asset> = HashMap::with_capacity(catalogued.len());
    let mut deleted = Vec::new();
    for asset in catalogued {
        if on_disk_names.contains(asset.file_name.as_str()) {
            by_name.insert(asset.file_name.clone(), asset);
        } else {
            deleted.push(asset);
        }
    }
    deleted.sort_by(|a, b| a.file_name.cmp(&b.file_name));

    let mut pending = Vec::new();
    for file in on_disk {
        match by_name.remove(&file.name) {
            None => pending.push(PendingAsset {
                file: file.clone(),
                previous: None,
            }),
            Some(previous) => {
                let unchanged = file
                    .facts
                    .as_ref()
                    .is_some_and(|facts| is_same_fingerprint(&previous, facts));
                if !unchanged {
                    pending.push(PendingAsset {
                        file: file.clone(),
                        previous: Some(previous),
                    });
                }
            }
        }
    }
    FolderDiff { deleted, pending }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{AssetHashes, Dimensions, FileFacts, Folder, MetadataFlag, Rotation};
    use std::path::PathBuf;

    fn asset(name: &str, size: u64, modified_ns: i64) -> Asset {
        let folder = Folder::new("/photos");
        Asset {
            folder_id: folder.id.clone(),
            folder,
            file_name: name.into(),
            file_size: size,
            created_ns: modified_ns,
            modified_ns,
            pixels: Dimensions::default(),
            thumbnail_pixels: Dimensions::default(),
            rotation: Rotation::None,
            hashes: AssetHashes::default(),
            corrupted: MetadataFlag::default(),
            rotated: MetadataFlag::default(),
            thumbnail_created_at: 0,
        }
    }

    fn disk(name: &str, size: u64, modified_ns: i64) -> DiskFile {
        DiskFile {
            name: name.into(),
            path: PathBuf::from("/photos").join(name),
            facts: Some(FileFacts {
                size,
                modified_ns,
                created_ns: modified_ns,
            }),
        }
    }

    #[test]
    fn classifies_new_changed_unchanged_and_deleted() {
        let catalogued = vec![
            asset("same.jpg", 10, 1),
            asset("changed.jpg", 10, 1),
            asset("gone.jpg", 10, 1),
        ];
        let on_disk = vec![
            disk("changed.jpg", 10, 2),
            disk("new.jpg", 5, 1),
            disk("same.jpg", 10, 1),
        ];

        let diff = diff_folder(catalogued, &on_disk);
        let deleted: Vec<&str> = diff.deleted.iter().map(|a| a.file_name.as_str()).collect();
        assert_eq!(deleted, vec!["gone.jpg"]);
        let pending: Vec<(&str, bool)> = diff
            .pending
            .iter()
            .map(|p| (p.file.name.as_str(), p.is_update()))
            .collect();
        assert_eq!(pending, vec![("changed.jpg", true), ("new.jpg", false)]);
    }

    #[test]
    fn unreadable_facts_count_as_changed() {
        let mut file = disk("a.jpg", 10, 1);
        file.facts = None;
        let diff = diff_folder(vec![asset("a.jpg", 10, 1)], &[file]);
        assert_eq!(diff.pending.len(), 1);
        assert!(diff.pending[0].is_update());
    }
}

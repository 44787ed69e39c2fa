use std::fs::Metadata;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use super::Asset;

/// Size and timestamps of a file as read from disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileFacts {
    pub size: u64,
    pub modified_ns: i64,
    /// Creation time when the platform reports one, otherwise the modified time.
    pub created_ns: i64,
}

/// Read the fingerprint facts for `path`.
pub fn read_facts(path: &Path) -> std::io::Result<FileFacts> {
    let meta = path.metadata()?;
    facts_from_metadata(&meta)
}

pub fn facts_from_metadata(meta: &Metadata) -> std::io::Result<FileFacts> {
    let modified_ns = to_nanos(meta.modified()?)?;
    let created_ns = match meta.created() {
        Ok(created) => to_nanos(created).unwrap_or(modified_ns),
        Err(_) => modified_ns,
    };
    Ok(FileFacts {
        size: meta.len(),
        modified_ns,
        created_ns,
    })
}

/// True when the catalogued record still matches the file on disk.
///
/// Only size and modification time are compared; content hashes are left to
/// the create and update path.
pub fn is_same_fingerprint(catalogued: &Asset, on_disk: &FileFacts) -> bool {
    catalogued.file_size == on_disk.size && catalogued.modified_ns == on_disk.modified_ns
}

fn to_nanos(time: SystemTime) -> std::io::Result<i64> {
    let duration = time
        .duration_since(UNIX_EPOCH)
        .map_err(|_| std::io::Error::other("file timestamp predates the unix epoch"))?;
    Ok(duration.as_nanos().min(i64::MAX as u128) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{AssetHashes, Dimensions, Folder, MetadataFlag, Rotation};
    use std::time::Duration;

    fn catalogued(size: u64, modified_ns: i64) -> Asset {
        let folder = Folder::new("/photos");
        Asset {
            folder_id: folder.id.clone(),
            folder,
            file_name: "a.jpg".into(),
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

    #[test]
    fn fingerprint_compares_size_and_modified_time() {
        let facts = FileFacts {
            size: 10,
            modified_ns: 5,
            created_ns: 5,
        };
        assert!(is_same_fingerprint(&catalogued(10, 5), &facts));
        assert!(!is_same_fingerprint(&catalogued(11, 5), &facts));
        assert!(!is_same_fingerprint(&catalogued(10, 6), &facts));
    }

    #[test]
    fn read_facts_reports_size_and_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.jpg");
        std::fs::write(&path, b"12345").unwrap();
        let stamp = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        std::fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(stamp)
            .unwrap();

        let facts = read_facts(&path).unwrap();
        assert_eq!(facts.size, 5);
        assert_eq!(facts.modified_ns, 1_700_000_000 * 1_000_000_000);
    }
}

use super::*;
use crate::catalog::{Asset, AssetHashes, Dimensions, Folder, MetadataFlag, Rotation};
use tempfile::tempdir;

fn sample_asset(folder: &Folder, name: &str) -> Asset {
    Asset {
        folder_id: folder.id.clone(),
        folder: folder.clone(),
        file_name: name.to_string(),
        file_size: 1234,
        created_ns: 10,
        modified_ns: 20,
        pixels: Dimensions::new(640, 480),
        thumbnail_pixels: Dimensions::new(200, 150),
        rotation: Rotation::Clockwise90,
        hashes: AssetHashes {
            content: Some("abc".into()),
            ..AssetHashes::default()
        },
        corrupted: MetadataFlag::default(),
        rotated: MetadataFlag::set("EXIF orientation 6"),
        thumbnail_created_at: 99,
    }
}

#[test]
fn open_creates_database_file_and_tables() {
    let dir = tempdir().unwrap();
    let store = CatalogStore::open(dir.path().join("catalog")).unwrap();
    assert!(store.db_path().is_file());
    assert!(store.load_folders().unwrap().is_empty());
    assert_eq!(store.revision().unwrap(), 0);
}

#[test]
fn write_batch_persists_folders_assets_and_thumbnails() {
    let dir = tempdir().unwrap();
    let store = CatalogStore::open(dir.path()).unwrap();
    let folder = Folder::new("/photos");
    let asset = sample_asset(&folder, "a.jpg");

    let mut batch = store.write_batch().unwrap();
    batch.upsert_folder(&folder).unwrap();
    batch.insert_asset(&asset).unwrap();
    batch.put_thumbnail(&folder.id, "a.jpg", &[1, 2, 3]).unwrap();
    batch.set_revision(4).unwrap();
    batch.commit().unwrap();

    assert_eq!(store.load_folders().unwrap(), vec![folder.clone()]);
    assert_eq!(store.load_assets().unwrap(), vec![asset]);
    assert_eq!(
        store.load_thumbnail(&folder.id, "a.jpg").unwrap(),
        Some(vec![1, 2, 3])
    );
    assert_eq!(store.revision().unwrap(), 4);
}

#[test]
fn removing_folder_cascades_to_assets_and_thumbnails() {
    let dir = tempdir().unwrap();
    let store = CatalogStore::open(dir.path()).unwrap();
    let folder = Folder::new("/photos/old");
    let mut batch = store.write_batch().unwrap();
    batch.upsert_folder(&folder).unwrap();
    batch.insert_asset(&sample_asset(&folder, "a.jpg")).unwrap();
    batch.put_thumbnail(&folder.id, "a.jpg", &[9]).unwrap();
    batch.commit().unwrap();

    let mut batch = store.write_batch().unwrap();
    batch.remove_folder(folder.id.as_str()).unwrap();
    batch.commit().unwrap();

    assert!(store.load_assets().unwrap().is_empty());
    assert_eq!(store.thumbnail_count().unwrap(), 0);
}

#[test]
fn orphan_thumbnails_are_pruned() {
    let dir = tempdir().unwrap();
    let store = CatalogStore::open(dir.path()).unwrap();
    let folder = Folder::new("/photos");
    let mut batch = store.write_batch().unwrap();
    batch.upsert_folder(&folder).unwrap();
    batch.put_thumbnail(&folder.id, "gone.jpg", &[1]).unwrap();
    assert_eq!(batch.prune_orphan_thumbnails().unwrap(), 1);
    batch.commit().unwrap();
    assert_eq!(store.thumbnail_count().unwrap(), 0);
}

#[test]
fn snapshot_and_restore_round_trip_rows() {
    let dir = tempdir().unwrap();
    let store = CatalogStore::open(dir.path().join("live")).unwrap();
    let folder = Folder::new("/photos");
    let mut batch = store.write_batch().unwrap();
    batch.upsert_folder(&folder).unwrap();
    batch.insert_asset(&sample_asset(&folder, "a.jpg")).unwrap();
    batch.put_thumbnail(&folder.id, "a.jpg", &[7, 7]).unwrap();
    batch.set_revision(1).unwrap();
    batch.commit().unwrap();

    let snapshot = dir.path().join("snapshot.db");
    store.snapshot_to(&snapshot).unwrap();

    let mut batch = store.write_batch().unwrap();
    batch.remove_folder(folder.id.as_str()).unwrap();
    batch.set_revision(2).unwrap();
    batch.commit().unwrap();
    assert!(store.load_assets().unwrap().is_empty());

    let revision = store.restore_from(&snapshot).unwrap();
    assert_eq!(revision, 3);
    assert_eq!(store.load_assets().unwrap().len(), 1);
    assert_eq!(
        store.load_thumbnail(&folder.id, "a.jpg").unwrap(),
        Some(vec![7, 7])
    );
}

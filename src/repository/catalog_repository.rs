use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

use time::Date;

use super::backup::{self, BACKUP_DIR_NAME, BackupManifest, BackupStorage};
use super::store::util::normalize_folder_path;
use super::store::CatalogStore;
use super::thumbnails::ThumbnailCache;
use super::{Repository, RepositoryError};
use crate::catalog::{Asset, Folder, FolderId};

/// Repository backed by a SQLite catalog and dated zip backups.
///
/// The whole index is held in memory; `save_catalog` writes it back in one
/// transaction.
pub struct CatalogRepository {
    store: CatalogStore,
    backups: BackupStorage,
    catalog_dir: PathBuf,
    folders: HashMap<PathBuf, Folder>,
    assets: HashMap<FolderId, BTreeMap<String, Asset>>,
    thumbnails: ThumbnailCache,
    revision: u64,
    has_changes: bool,
}

impl CatalogRepository {
    /// Open the catalog stored in `catalog_dir`, creating it when missing.
    pub fn open(catalog_dir: impl AsRef<Path>) -> Result<Self, RepositoryError> {
        let catalog_dir = catalog_dir.as_ref().to_path_buf();
        let store = CatalogStore::open(&catalog_dir)?;
        let backups = BackupStorage::new(catalog_dir.join(BACKUP_DIR_NAME));
        let mut repository = Self {
            store,
            backups,
            catalog_dir,
            folders: HashMap::new(),
            assets: HashMap::new(),
            thumbnails: ThumbnailCache::default(),
            revision: 0,
            has_changes: false,
        };
        repository.reload()?;
        Ok(repository)
    }

    pub fn catalog_dir(&self) -> &Path {
        &self.catalog_dir
    }

    pub fn backups(&self) -> &BackupStorage {
        &self.backups
    }

    /// Revision of the last committed save.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Thumbnail bytes for an asset, read from storage on first access.
    pub fn load_thumbnail(
        &mut self,
        folder_path: &Path,
        file_name: &str,
    ) -> Result<Option<Vec<u8>>, RepositoryError> {
        let folder_path = normalize_folder_path(folder_path);
        if let Some(bytes) = self.thumbnails.get(&folder_path, file_name) {
            return Ok(Some(bytes.to_vec()));
        }
        let Some(folder) = self.folders.get(&folder_path) else {
            return Ok(None);
        };
        let known = self
            .assets
            .get(&folder.id)
            .is_some_and(|assets| assets.contains_key(file_name));
        if !known {
            return Ok(None);
        }
        let loaded = self.store.load_thumbnail(&folder.id, file_name)?;
        if let Some(bytes) = &loaded {
            self.thumbnails
                .remember(&folder_path, file_name, bytes.clone());
        }
        Ok(loaded)
    }

    /// Dates that have a backup archive, oldest first.
    pub fn backup_dates(&self) -> Result<Vec<Date>, RepositoryError> {
        self.backups.list_dates()
    }

    /// Replace the catalog with the contents of the backup taken on `date`.
    ///
    /// Unsaved in-memory changes are discarded.
    pub fn restore_backup(&mut self, date: Date) -> Result<(), RepositoryError> {
        let staging = tempfile::tempdir_in(&self.catalog_dir).map_err(|source| {
            RepositoryError::Io {
                path: self.catalog_dir.clone(),
                source,
            }
        })?;
        let extracted = staging.path().join(super::DB_FILE_NAME);
        self.backups.extract_catalog(date, &extracted)?;
        let revision = self.store.restore_from(&extracted)?;
        self.reload()?;
        tracing::info!(
            date = %backup::format_date(date)?,
            revision,
            folders = self.folders.len(),
            "Restored catalog from backup"
        );
        Ok(())
    }

    fn reload(&mut self) -> Result<(), RepositoryError> {
        self.folders.clear();
        self.assets.clear();
        self.thumbnails.clear();
        for folder in self.store.load_folders()? {
            self.folders.insert(folder.path.clone(), folder);
        }
        for asset in self.store.load_assets()? {
            self.assets
                .entry(asset.folder_id.clone())
                .or_default()
                .insert(asset.file_name.clone(), asset);
        }
        self.revision = self.store.revision()?;
        self.has_changes = false;
        Ok(())
    }

    fn manifest(&self) -> BackupManifest {
        BackupManifest {
            revision: self.revision,
            folders: self.folders.len(),
            assets: self.assets.values().map(BTreeMap::len).sum(),
            created_at: time::OffsetDateTime::now_utc().unix_timestamp(),
        }
    }

    fn write_state(&self, revision: u64) -> Result<(), RepositoryError> {
        let mut batch = self.store.write_batch()?;
        let live_ids: HashSet<&str> = self
            .folders
            .values()
            .map(|folder| folder.id.as_str())
            .collect();
        for stored_id in batch.folder_ids()? {
            if !live_ids.contains(stored_id.as_str()) {
                batch.remove_folder(&stored_id)?;
            }
        }
        for folder in self.folders.values() {
            batch.upsert_folder(folder)?;
        }
        batch.clear_assets()?;
        for asset in self.assets.values().flat_map(BTreeMap::values) {
            batch.insert_asset(asset)?;
        }
        for (folder_path, file_name) in self.thumbnails.dirty_entries() {
            let Some(folder) = self.folders.get(&folder_path) else {
                continue;
            };
            match self.thumbnails.get(&folder_path, &file_name) {
                Some(bytes) => batch.put_thumbnail(&folder.id, &file_name, bytes)?,
                None => batch.remove_thumbnail(&folder.id, &file_name)?,
            }
        }
        batch.prune_orphan_thumbnails()?;
        batch.set_revision(revision)?;
        batch.commit()
    }

    fn ensure_folder(&mut self, folder: &Folder) {
        let path = normalize_folder_path(&folder.path);
        if !self.folders.contains_key(&path) {
            self.folders.insert(
                path.clone(),
                Folder {
                    id: folder.id.clone(),
                    path,
                },
            );
            self.has_changes = true;
        }
    }

    fn store_asset(&mut self, asset: Asset) {
        self.assets
            .entry(asset.folder_id.clone())
            .or_default()
            .insert(asset.file_name.clone(), asset);
        self.has_changes = true;
    }
}

impl Repository for CatalogRepository {
    fn folder_by_path(&self, path: &Path) -> Option<Folder> {
        self.folders.get(&normalize_folder_path(path)).cloned()
    }

    fn folders(&self) -> Vec<Folder> {
        let mut folders: Vec<Folder> = self.folders.values().cloned().collect();
        folders.sort_by(|a, b| a.path.cmp(&b.path));
        folders
    }

    fn add_folder(&mut self, path: &Path) -> Folder {
        let path = normalize_folder_path(path);
        if let Some(existing) = self.folders.get(&path) {
            return existing.clone();
        }
        let folder = Folder::new(path.clone());
        self.folders.insert(path, folder.clone());
        self.has_changes = true;
        folder
    }

    fn delete_folder(&mut self, folder: &Folder) {
        let path = normalize_folder_path(&folder.path);
        let removed = self.folders.remove(&path);
        let assets = self.assets.remove(&folder.id);
        self.thumbnails.remove_folder(&path);
        if removed.is_some() || assets.is_some() {
            self.has_changes = true;
        }
    }

    fn cataloged_assets_by_path(&self, path: &Path) -> Vec<Asset> {
        let Some(folder) = self.folders.get(&normalize_folder_path(path)) else {
            return Vec::new();
        };
        self.assets
            .get(&folder.id)
            .map(|assets| assets.values().cloned().collect())
            .unwrap_or_default()
    }

    fn cataloged_assets(&self) -> Vec<Asset> {
        let mut folders: Vec<&Folder> = self.folders.values().collect();
        folders.sort_by(|a, b| a.path.cmp(&b.path));
        folders
            .into_iter()
            .filter_map(|folder| self.assets.get(&folder.id))
            .flat_map(|assets| assets.values().cloned())
            .collect()
    }

    fn add_asset(&mut self, asset: Asset, thumbnail: Vec<u8>) {
        self.ensure_folder(&asset.folder);
        let folder_path = normalize_folder_path(&asset.folder.path);
        self.thumbnails
            .insert(&folder_path, &asset.file_name, thumbnail);
        self.store_asset(asset);
    }

    fn update_asset(&mut self, asset: Asset, thumbnail: Option<Vec<u8>>) {
        self.ensure_folder(&asset.folder);
        if let Some(thumbnail) = thumbnail {
            let folder_path = normalize_folder_path(&asset.folder.path);
            self.thumbnails
                .insert(&folder_path, &asset.file_name, thumbnail);
        }
        self.store_asset(asset);
    }

    fn delete_asset(&mut self, folder: &Folder, file_name: &str) -> Option<Asset> {
        let assets = self.assets.get_mut(&folder.id)?;
        let removed = assets.remove(file_name)?;
        if assets.is_empty() {
            self.assets.remove(&folder.id);
        }
        self.thumbnails
            .remove(&normalize_folder_path(&folder.path), file_name);
        self.has_changes = true;
        Some(removed)
    }

    fn has_changes(&self) -> bool {
        self.has_changes
    }

    fn save_catalog(&mut self) -> Result<(), RepositoryError> {
        let next_revision = self.revision + 1;
        self.write_state(next_revision)?;
        self.thumbnails.clear_dirty();
        self.revision = next_revision;
        self.has_changes = false;
        tracing::debug!(revision = self.revision, "Catalog saved");
        Ok(())
    }

    fn backup_exists(&self, date: Date) -> bool {
        match self.backups.exists_for(date) {
            Ok(exists) => exists,
            Err(err) => {
                tracing::warn!(error = %err, "Failed to resolve backup path");
                false
            }
        }
    }

    fn write_backup(&mut self, date: Date) -> Result<(), RepositoryError> {
        let staging = tempfile::tempdir_in(&self.catalog_dir).map_err(|source| {
            RepositoryError::Io {
                path: self.catalog_dir.clone(),
                source,
            }
        })?;
        let snapshot = staging.path().join(super::DB_FILE_NAME);
        self.store.snapshot_to(&snapshot)?;
        let path = self
            .backups
            .write(date, &snapshot, &self.manifest())?;
        tracing::info!(path = %path.display(), revision = self.revision, "Backup written");
        Ok(())
    }

    fn backup_is_out_of_date(&self, date: Date) -> bool {
        match self.backups.read_manifest(date) {
            Ok(Some(manifest)) => manifest.revision != self.revision,
            Ok(None) => true,
            Err(err) => {
                tracing::warn!(error = %err, "Unreadable backup manifest, treating backup as stale");
                true
            }
        }
    }
}

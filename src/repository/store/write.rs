use std::collections::HashSet;
use std::path::Path;

use rusqlite::params;

use super::util::{map_sql_error, path_to_db};
use super::{CatalogStore, CatalogWriteBatch, REVISION_KEY, RepositoryError};
use crate::catalog::{Asset, Folder, FolderId};

impl CatalogStore {
    /// Start a write batch that wraps related mutations in a single transaction.
    pub fn write_batch(&self) -> Result<CatalogWriteBatch<'_>, RepositoryError> {
        let tx = self
            .connection
            .unchecked_transaction()
            .map_err(map_sql_error)?;
        Ok(CatalogWriteBatch { tx })
    }

    /// Write a compacted copy of the database to `target`, which must not exist yet.
    pub fn snapshot_to(&self, target: &Path) -> Result<(), RepositoryError> {
        self.connection
            .execute("VACUUM INTO ?1", params![path_to_db(target)])
            .map_err(map_sql_error)?;
        Ok(())
    }

    /// Replace every folder, asset and thumbnail with the rows of another
    /// catalog database, then bump the revision.
    pub fn restore_from(&self, source: &Path) -> Result<u64, RepositoryError> {
        self.connection
            .execute(
                "ATTACH DATABASE ?1 AS restored",
                params![path_to_db(source)],
            )
            .map_err(map_sql_error)?;
        let result = self.copy_attached_rows();
        let detached = self
            .connection
            .execute_batch("DETACH DATABASE restored")
            .map_err(map_sql_error);
        let revision = result?;
        detached?;
        Ok(revision)
    }

    fn copy_attached_rows(&self) -> Result<u64, RepositoryError> {
        let next_revision = self.revision()? + 1;
        let mut batch = self.write_batch()?;
        batch
            .tx
            .execute_batch(
                "DELETE FROM thumbnails;
                 DELETE FROM assets;
                 DELETE FROM folders;
                 INSERT INTO folders (id, path) SELECT id, path FROM restored.folders;
                 INSERT INTO assets SELECT * FROM restored.assets;
                 INSERT INTO thumbnails (folder_id, file_name, data)
                     SELECT folder_id, file_name, data FROM restored.thumbnails;",
            )
            .map_err(map_sql_error)?;
        batch.set_revision(next_revision)?;
        batch.commit()?;
        Ok(next_revision)
    }
}

impl<'conn> CatalogWriteBatch<'conn> {
    /// Identifiers of every folder currently stored.
    pub fn folder_ids(&mut self) -> Result<HashSet<String>, RepositoryError> {
        let mut stmt = self
            .tx
            .prepare_cached("SELECT id FROM folders")
            .map_err(map_sql_error)?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(map_sql_error)?;
        rows.collect::<Result<HashSet<_>, _>>()
            .map_err(map_sql_error)
    }

    /// Insert a folder row; existing rows are immutable and left untouched.
    pub fn upsert_folder(&mut self, folder: &Folder) -> Result<(), RepositoryError> {
        self.tx
            .prepare_cached(
                "INSERT INTO folders (id, path) VALUES (?1, ?2)
                 ON CONFLICT(id) DO NOTHING",
            )
            .map_err(map_sql_error)?
            .execute(params![folder.id.as_str(), path_to_db(&folder.path)])
            .map_err(map_sql_error)?;
        Ok(())
    }

    /// Remove a folder row; its assets and thumbnails cascade.
    pub fn remove_folder(&mut self, folder_id: &str) -> Result<(), RepositoryError> {
        self.tx
            .prepare_cached("DELETE FROM folders WHERE id = ?1")
            .map_err(map_sql_error)?
            .execute(params![folder_id])
            .map_err(map_sql_error)?;
        Ok(())
    }

    /// Drop every asset row ahead of a full rewrite.
    pub fn clear_assets(&mut self) -> Result<(), RepositoryError> {
        self.tx
            .execute("DELETE FROM assets", [])
            .map_err(map_sql_error)?;
        Ok(())
    }

    pub fn insert_asset(&mut self, asset: &Asset) -> Result<(), RepositoryError> {
        self.tx
            .prepare_cached(
                "INSERT INTO assets (folder_id, file_name, file_size, created_ns, modified_ns,
                                     width, height, thumbnail_width, thumbnail_height, rotation,
                                     hash_content, hash_difference, hash_perceptual,
                                     corrupted, corrupted_message, rotated, rotated_message,
                                     thumbnail_created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                         ?16, ?17, ?18)",
            )
            .map_err(map_sql_error)?
            .execute(params![
                asset.folder_id.as_str(),
                asset.file_name,
                asset.file_size as i64,
                asset.created_ns,
                asset.modified_ns,
                asset.pixels.width,
                asset.pixels.height,
                asset.thumbnail_pixels.width,
                asset.thumbnail_pixels.height,
                asset.rotation.degrees(),
                asset.hashes.content,
                asset.hashes.difference,
                asset.hashes.perceptual,
                asset.corrupted.is_set,
                asset.corrupted.message,
                asset.rotated.is_set,
                asset.rotated.message,
                asset.thumbnail_created_at,
            ])
            .map_err(map_sql_error)?;
        Ok(())
    }

    pub fn put_thumbnail(
        &mut self,
        folder_id: &FolderId,
        file_name: &str,
        data: &[u8],
    ) -> Result<(), RepositoryError> {
        self.tx
            .prepare_cached(
                "INSERT INTO thumbnails (folder_id, file_name, data) VALUES (?1, ?2, ?3)
                 ON CONFLICT(folder_id, file_name) DO UPDATE SET data = excluded.data",
            )
            .map_err(map_sql_error)?
            .execute(params![folder_id.as_str(), file_name, data])
            .map_err(map_sql_error)?;
        Ok(())
    }

    pub fn remove_thumbnail(
        &mut self,
        folder_id: &FolderId,
        file_name: &str,
    ) -> Result<(), RepositoryError> {
        self.tx
            .prepare_cached("DELETE FROM thumbnails WHERE folder_id = ?1 AND file_name = ?2")
            .map_err(map_sql_error)?
            .execute(params![folder_id.as_str(), file_name])
            .map_err(map_sql_error)?;
        Ok(())
    }

    /// Remove thumbnails whose asset row no longer exists.
    pub fn prune_orphan_thumbnails(&mut self) -> Result<usize, RepositoryError> {
        self.tx
            .execute(
                "DELETE FROM thumbnails WHERE NOT EXISTS (
                     SELECT 1 FROM assets a
                     WHERE a.folder_id = thumbnails.folder_id
                       AND a.file_name = thumbnails.file_name
                 )",
                [],
            )
            .map_err(map_sql_error)
    }

    pub fn set_revision(&mut self, revision: u64) -> Result<(), RepositoryError> {
        self.tx
            .prepare_cached(
                "INSERT INTO metadata (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            )
            .map_err(map_sql_error)?
            .execute(params![REVISION_KEY, revision.to_string()])
            .map_err(map_sql_error)?;
        Ok(())
    }

    /// Commit all batched operations atomically.
    pub fn commit(self) -> Result<(), RepositoryError> {
        self.tx.commit().map_err(map_sql_error)?;
        Ok(())
    }
}

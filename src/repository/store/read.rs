use std::path::PathBuf;

use rusqlite::{OptionalExtension, Row, params};

use super::util::map_sql_error;
use super::{CatalogStore, REVISION_KEY, RepositoryError};
use crate::catalog::{Asset, AssetHashes, Dimensions, Folder, FolderId, MetadataFlag, Rotation};

const ASSET_COLUMNS: &str = "a.folder_id, f.path, a.file_name, a.file_size, a.created_ns,
     a.modified_ns, a.width, a.height, a.thumbnail_width, a.thumbnail_height, a.rotation,
     a.hash_content, a.hash_difference, a.hash_perceptual, a.corrupted, a.corrupted_message,
     a.rotated, a.rotated_message, a.thumbnail_created_at";

impl CatalogStore {
    /// Load every persisted folder ordered by path.
    pub fn load_folders(&self) -> Result<Vec<Folder>, RepositoryError> {
        let mut stmt = self
            .connection
            .prepare("SELECT id, path FROM folders ORDER BY path ASC")
            .map_err(map_sql_error)?;
        let rows = stmt
            .query_map([], |row| {
                let id: String = row.get(0)?;
                let path: String = row.get(1)?;
                Ok(Folder {
                    id: FolderId::from_string(id),
                    path: PathBuf::from(path),
                })
            })
            .map_err(map_sql_error)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(map_sql_error)
    }

    /// Load every persisted asset, joined with its folder.
    pub fn load_assets(&self) -> Result<Vec<Asset>, RepositoryError> {
        let sql = format!(
            "SELECT {ASSET_COLUMNS}
             FROM assets a JOIN folders f ON f.id = a.folder_id
             ORDER BY f.path ASC, a.file_name ASC"
        );
        let mut stmt = self.connection.prepare(&sql).map_err(map_sql_error)?;
        let rows = stmt.query_map([], asset_from_row).map_err(map_sql_error)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(map_sql_error)
    }

    /// Fetch the stored thumbnail bytes for one asset, if any.
    pub fn load_thumbnail(
        &self,
        folder_id: &FolderId,
        file_name: &str,
    ) -> Result<Option<Vec<u8>>, RepositoryError> {
        self.connection
            .query_row(
                "SELECT data FROM thumbnails WHERE folder_id = ?1 AND file_name = ?2",
                params![folder_id.as_str(), file_name],
                |row| row.get(0),
            )
            .optional()
            .map_err(map_sql_error)
    }

    /// Number of stored thumbnails.
    pub fn thumbnail_count(&self) -> Result<usize, RepositoryError> {
        let count: i64 = self
            .connection
            .query_row("SELECT COUNT(*) FROM thumbnails", [], |row| row.get(0))
            .map_err(map_sql_error)?;
        Ok(count.max(0) as usize)
    }

    /// Revision counter bumped by every committed save.
    pub fn revision(&self) -> Result<u64, RepositoryError> {
        let value: Option<String> = self
            .connection
            .query_row(
                "SELECT value FROM metadata WHERE key = ?1",
                params![REVISION_KEY],
                |row| row.get(0),
            )
            .optional()
            .map_err(map_sql_error)?;
        Ok(value
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(0))
    }
}

fn asset_from_row(row: &Row<'_>) -> rusqlite::Result<Asset> {
    let folder_id = FolderId::from_string(row.get::<_, String>(0)?);
    let folder = Folder {
        id: folder_id.clone(),
        path: PathBuf::from(row.get::<_, String>(1)?),
    };
    Ok(Asset {
        folder_id,
        folder,
        file_name: row.get(2)?,
        file_size: row.get::<_, i64>(3)?.max(0) as u64,
        created_ns: row.get(4)?,
        modified_ns: row.get(5)?,
        pixels: Dimensions::new(row.get(6)?, row.get(7)?),
        thumbnail_pixels: Dimensions::new(row.get(8)?, row.get(9)?),
        rotation: Rotation::from_degrees(row.get(10)?),
        hashes: AssetHashes {
            content: row.get(11)?,
            difference: row.get(12)?,
            perceptual: row.get(13)?,
        },
        corrupted: MetadataFlag {
            is_set: row.get::<_, i64>(14)? != 0,
            message: row.get(15)?,
        },
        rotated: MetadataFlag {
            is_set: row.get::<_, i64>(16)? != 0,
            message: row.get(17)?,
        },
        thumbnail_created_at: row.get(18)?,
    })
}

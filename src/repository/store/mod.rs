//! SQLite persistence for the catalog: folders, asset metadata and thumbnails.

mod read;
mod schema;
pub(crate) mod util;
mod write;

use std::path::{Path, PathBuf};

use rusqlite::{Connection, Transaction};

use super::RepositoryError;

/// Database filename stored inside the catalog directory.
pub const DB_FILE_NAME: &str = "catalog.db";

pub(crate) const REVISION_KEY: &str = "catalog_revision";

/// SQLite wrapper holding the persisted catalog.
pub struct CatalogStore {
    connection: Connection,
    db_path: PathBuf,
}

/// Groups catalog writes into one transaction using cached statements.
pub struct CatalogWriteBatch<'conn> {
    tx: Transaction<'conn>,
}

impl CatalogStore {
    /// Open (or create) the catalog database inside `catalog_dir`.
    pub fn open(catalog_dir: impl AsRef<Path>) -> Result<Self, RepositoryError> {
        let db_path = catalog_dir.as_ref().join(DB_FILE_NAME);
        util::create_parent_if_needed(&db_path)?;
        let connection = Connection::open(&db_path).map_err(util::map_sql_error)?;
        let store = Self {
            connection,
            db_path,
        };
        store.apply_pragmas()?;
        schema::apply_schema(&store.connection)?;
        Ok(store)
    }

    /// Path of the database file on disk.
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn apply_pragmas(&self) -> Result<(), RepositoryError> {
        self.connection
            .execute_batch(
                "PRAGMA journal_mode=WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys=ON;
             PRAGMA busy_timeout=5000;
             PRAGMA temp_store=MEMORY;
             PRAGMA cache_size=-32000;",
            )
            .map_err(util::map_sql_error)
    }
}

#[cfg(test)]
mod tests;

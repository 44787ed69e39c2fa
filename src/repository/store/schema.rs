use rusqlite::Connection;

use super::super::RepositoryError;
use super::util::map_sql_error;

pub(super) fn apply_schema(connection: &Connection) -> Result<(), RepositoryError> {
    connection
        .execute_batch(
            "CREATE TABLE IF NOT EXISTS metadata (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
             );
             CREATE TABLE IF NOT EXISTS folders (
                id TEXT PRIMARY KEY,
                path TEXT NOT NULL UNIQUE
             );
             CREATE TABLE IF NOT EXISTS assets (
                folder_id TEXT NOT NULL,
                file_name TEXT NOT NULL,
                file_size INTEGER NOT NULL,
                created_ns INTEGER NOT NULL,
                modified_ns INTEGER NOT NULL,
                width INTEGER NOT NULL,
                height INTEGER NOT NULL,
                thumbnail_width INTEGER NOT NULL,
                thumbnail_height INTEGER NOT NULL,
                rotation INTEGER NOT NULL DEFAULT 0,
                hash_content TEXT,
                hash_difference TEXT,
                hash_perceptual TEXT,
                corrupted INTEGER NOT NULL DEFAULT 0,
                corrupted_message TEXT,
                rotated INTEGER NOT NULL DEFAULT 0,
                rotated_message TEXT,
                thumbnail_created_at INTEGER NOT NULL,
                PRIMARY KEY (folder_id, file_name),
                FOREIGN KEY(folder_id) REFERENCES folders(id) ON DELETE CASCADE
             ) WITHOUT ROWID;
             CREATE TABLE IF NOT EXISTS thumbnails (
                folder_id TEXT NOT NULL,
                file_name TEXT NOT NULL,
                data BLOB NOT NULL,
                PRIMARY KEY (folder_id, file_name),
                FOREIGN KEY(folder_id) REFERENCES folders(id) ON DELETE CASCADE
             ) WITHOUT ROWID;",
        )
        .map_err(map_sql_error)
}

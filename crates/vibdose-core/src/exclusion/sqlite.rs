//! SQLite exclusion store kept alongside the log files
//!
//! One table, one row per excluded (or explicitly re-included) trace:
//!
//! ```sql
//! trace (id INTEGER PRIMARY KEY, filename TEXT, datetime BIGINT, exclusion INT)
//! ```

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};

use super::{ExclusionKey, ExclusionStore, StoreError};

const SCHEMA_SQL: &str = "CREATE TABLE IF NOT EXISTS trace (
    id INTEGER PRIMARY KEY,
    filename TEXT,
    datetime BIGINT,
    exclusion INT
)";

/// Exclusion store backed by a SQLite file
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    path: PathBuf,
}

impl SqliteStore {
    /// Open (or create) the store at `path`
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let open_err = |source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        };
        let conn = Connection::open(path).map_err(open_err)?;
        conn.execute_batch(SCHEMA_SQL).map_err(open_err)?;

        tracing::debug!(path = %path.display(), "Opened exclusion store");
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    /// Open the store file `file_name` inside a log directory
    pub fn open_in(dir: &Path, file_name: &str) -> Result<Self, StoreError> {
        Self::open(&dir.join(file_name))
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn row_id(&self, key: &ExclusionKey) -> Result<Option<i64>, StoreError> {
        let id = self
            .conn
            .query_row(
                "SELECT id FROM trace WHERE filename = ?1 AND datetime = ?2",
                params![key.file_name, key.epoch_secs],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }
}

impl ExclusionStore for SqliteStore {
    fn get(&self, key: &ExclusionKey) -> Result<Option<u32>, StoreError> {
        let code = self
            .conn
            .query_row(
                "SELECT exclusion FROM trace WHERE filename = ?1 AND datetime = ?2",
                params![key.file_name, key.epoch_secs],
                |row| row.get::<_, Option<i64>>(0),
            )
            .optional()?;
        // A NULL or negative column reads as "not excluded"
        Ok(code.map(|c| c.and_then(|c| u32::try_from(c).ok()).unwrap_or(0)))
    }

    fn put(&mut self, key: &ExclusionKey, code: u32) -> Result<(), StoreError> {
        match self.row_id(key)? {
            Some(id) => {
                self.conn.execute(
                    "UPDATE trace SET exclusion = ?1 WHERE id = ?2",
                    params![code, id],
                )?;
            }
            None => {
                self.conn.execute(
                    "INSERT INTO trace (filename, datetime, exclusion) VALUES (?1, ?2, ?3)",
                    params![key.file_name, key.epoch_secs, code],
                )?;
            }
        }
        tracing::debug!(file = %key.file_name, epoch = key.epoch_secs, code, "Stored exclusion");
        Ok(())
    }
}

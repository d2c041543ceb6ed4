//! SQLite implementation of the StateStore trait.
//!
//! The durable backend: payloads written here survive a full document
//! reload, which is what lets back/forward recall recover state after the
//! page is torn down and rebuilt.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};

use wayline_core::{StateId, StatePayload};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::StateStore;

/// SQLite-based store implementation.
///
/// Thread-safe via an internal Mutex around the connection. Operations are
/// synchronous per the store contract.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing the durable path without touching disk.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Execute an operation on the connection.
    fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock().map_err(|e| {
            StoreError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_LOCKED),
                Some(format!("mutex poisoned: {}", e)),
            ))
        })?;
        f(&conn)
    }
}

impl StateStore for SqliteStore {
    fn put(&self, id: &StateId, payload: &StatePayload) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO nav_state (state_id, payload, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(state_id) DO UPDATE SET payload = ?2, updated_at = ?3",
                params![id.as_bytes().as_slice(), payload.as_bytes(), now_millis()],
            )?;
            Ok(())
        })
    }

    fn get(&self, id: &StateId) -> Result<Option<StatePayload>> {
        self.with_conn(|conn| {
            let bytes: Option<Vec<u8>> = conn
                .query_row(
                    "SELECT payload FROM nav_state WHERE state_id = ?1",
                    params![id.as_bytes().as_slice()],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(bytes.map(StatePayload::from_bytes))
        })
    }

    fn remove(&self, id: &StateId) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "DELETE FROM nav_state WHERE state_id = ?1",
                params![id.as_bytes().as_slice()],
            )?;
            Ok(())
        })
    }

    fn is_durable(&self) -> bool {
        true
    }

    fn len(&self) -> Result<usize> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM nav_state", [], |row| row.get(0))?;
            Ok(count as usize)
        })
    }

    fn prune_except(&self, keep: &[StateId]) -> Result<usize> {
        self.with_conn(|conn| {
            // Stage the keep-list in a temp table; the stack is small (one
            // row per live history entry) so a full scan is fine.
            conn.execute("CREATE TEMP TABLE IF NOT EXISTS keep_ids (state_id BLOB PRIMARY KEY)", [])?;
            conn.execute("DELETE FROM keep_ids", [])?;
            {
                let mut stmt =
                    conn.prepare("INSERT OR IGNORE INTO keep_ids (state_id) VALUES (?1)")?;
                for id in keep {
                    stmt.execute(params![id.as_bytes().as_slice()])?;
                }
            }
            let pruned = conn.execute(
                "DELETE FROM nav_state WHERE state_id NOT IN (SELECT state_id FROM keep_ids)",
                [],
            )?;
            if pruned > 0 {
                tracing::debug!(pruned, "pruned orphaned payloads");
            }
            Ok(pruned)
        })
    }
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_millis() as i64
}

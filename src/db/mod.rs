//! Persistence gateway for the workbasket engine.
//!
//! `Database` is a connection source: it knows where the SQLite database lives
//! and opens connections on demand. The row modules (`workbaskets`,
//! `distribution_targets`, `access_items`) are plain record-level CRUD over a
//! borrowed connection and never issue transaction control themselves.

pub mod access_items;
pub mod distribution_targets;
pub mod workbaskets;

use crate::error::Result;
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Default busy timeout applied to every connection.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone)]
enum Location {
    File(PathBuf),
    /// Shared-cache URI of a named in-memory database.
    Memory(String),
}

/// Database handle: a source of SQLite connections to one database.
#[derive(Clone)]
pub struct Database {
    location: Location,
    busy_timeout: Duration,
    /// Keeps a named in-memory database alive between per-call connections.
    /// Held, never read.
    #[allow(dead_code)]
    anchor: Option<Arc<Mutex<Connection>>>,
}

impl Database {
    /// Open or create the database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_timeout(path, DEFAULT_BUSY_TIMEOUT)
    }

    pub fn open_with_timeout<P: AsRef<Path>>(path: P, busy_timeout: Duration) -> Result<Self> {
        let db = Self {
            location: Location::File(path.as_ref().to_path_buf()),
            busy_timeout,
            anchor: None,
        };

        let mut conn = db.connect()?;
        // WAL is persistent, so setting it once on open is enough.
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        embedded::migrations::runner().run(&mut conn)?;

        tracing::debug!(path = %path.as_ref().display(), "Opened workbasket database");
        Ok(db)
    }

    /// Open a private in-memory database (for testing).
    ///
    /// Every connection opened from the returned handle (and its clones) sees
    /// the same data until the last handle is dropped.
    pub fn open_in_memory() -> Result<Self> {
        let uri = format!("file:workbasket-{}?mode=memory&cache=shared", Uuid::new_v4());
        let mut db = Self {
            location: Location::Memory(uri),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            anchor: None,
        };

        let mut anchor = db.connect()?;
        embedded::migrations::runner().run(&mut anchor)?;
        db.anchor = Some(Arc::new(Mutex::new(anchor)));

        Ok(db)
    }

    /// Open a new connection to this database.
    pub fn connect(&self) -> Result<Connection> {
        let conn = match &self.location {
            Location::File(path) => Connection::open(path)?,
            Location::Memory(uri) => Connection::open_with_flags(uri, OpenFlags::default())?,
        };

        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        conn.busy_timeout(self.busy_timeout)?;

        Ok(conn)
    }

    /// Path of the database file, if it is file-backed.
    pub fn path(&self) -> Option<&Path> {
        match &self.location {
            Location::File(path) => Some(path),
            Location::Memory(_) => None,
        }
    }
}

/// Get the current timestamp in milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_connections_share_data() {
        let db = Database::open_in_memory().unwrap();

        let writer = db.connect().unwrap();
        writer
            .execute(
                "INSERT INTO workbaskets (id, name, created_at, modified_at) VALUES ('a', 'A', 1, 1)",
                [],
            )
            .unwrap();
        drop(writer);

        let reader = db.connect().unwrap();
        let count: i64 = reader
            .query_row("SELECT COUNT(*) FROM workbaskets", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_in_memory_databases_are_isolated() {
        let first = Database::open_in_memory().unwrap();
        let second = Database::open_in_memory().unwrap();

        first
            .connect()
            .unwrap()
            .execute(
                "INSERT INTO workbaskets (id, name, created_at, modified_at) VALUES ('a', 'A', 1, 1)",
                [],
            )
            .unwrap();

        let count: i64 = second
            .connect()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM workbaskets", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_file_database_runs_migrations() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path().join("wb.db")).unwrap();

        let conn = db.connect().unwrap();
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'
                 AND name IN ('workbaskets', 'distribution_targets', 'workbasket_access_items')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 3);
        assert!(db.path().is_some());
    }

    #[test]
    fn test_reopen_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wb.db");
        Database::open(&path).unwrap();
        Database::open(&path).unwrap();
    }
}

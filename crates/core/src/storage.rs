//! SQLite storage engine.
//!
//! The engine owns the location of the database and hands out [`Session`]s,
//! each of which owns its own connection for the duration of one unit of work.
//! Dropping a session closes its connection, whatever path the caller takes
//! out of the unit of work.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use rusqlite::{Connection, OpenFlags, Transaction, TransactionBehavior};
use thiserror::Error;
use tracing::{debug, info, trace};

/// Default time a session waits on a locked database file.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Errors raised by the storage engine.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying SQLite failure.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

#[derive(Debug, Clone)]
enum Location {
    File(PathBuf),
    /// Shared-cache URI of a private in-memory database.
    Memory(String),
}

/// Entry point to the ticket database.
pub struct StorageEngine {
    location: Location,
    busy_timeout: Duration,
    /// Keeps an in-memory database alive between sessions.
    _anchor: Option<Mutex<Connection>>,
}

impl StorageEngine {
    /// Open (creating if needed) the database file at `path` and make sure
    /// the schema exists.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        Self::open_with_timeout(path, DEFAULT_BUSY_TIMEOUT)
    }

    /// Like [`StorageEngine::open`], with a custom busy timeout for sessions.
    pub fn open_with_timeout(path: &Path, busy_timeout: Duration) -> Result<Self, StorageError> {
        let engine = Self {
            location: Location::File(path.to_path_buf()),
            busy_timeout,
            _anchor: None,
        };

        let conn = engine.connect()?;
        // WAL lets readers proceed while a writer holds the lock.
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        debug!(journal_mode = %mode, "Configured journal mode");
        initialize_schema(&conn)?;

        info!(path = %path.display(), "Storage engine ready");
        Ok(engine)
    }

    /// Create a private in-memory database (useful for testing).
    ///
    /// Every session of this engine sees the same data; separate engines are
    /// isolated from each other.
    pub fn in_memory() -> Result<Self, StorageError> {
        let uri = format!(
            "file:helpdesk-{}?mode=memory&cache=shared",
            uuid::Uuid::new_v4().simple()
        );
        let mut engine = Self {
            location: Location::Memory(uri),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            _anchor: None,
        };

        let anchor = engine.connect()?;
        initialize_schema(&anchor)?;
        engine._anchor = Some(Mutex::new(anchor));

        debug!("In-memory storage engine ready");
        Ok(engine)
    }

    /// Path of the database file, `None` for in-memory engines.
    pub fn path(&self) -> Option<&Path> {
        match &self.location {
            Location::File(path) => Some(path),
            Location::Memory(_) => None,
        }
    }

    /// Acquire a session for one unit of work.
    pub fn session(&self) -> Result<Session, StorageError> {
        let conn = self.connect()?;
        trace!("Storage session opened");
        Ok(Session { conn })
    }

    fn connect(&self) -> Result<Connection, StorageError> {
        let conn = match &self.location {
            Location::File(path) => Connection::open(path)?,
            Location::Memory(uri) => {
                Connection::open_with_flags(uri, OpenFlags::default() | OpenFlags::SQLITE_OPEN_URI)?
            }
        };
        conn.busy_timeout(self.busy_timeout)?;
        Ok(conn)
    }
}

/// Create the ticket table and its indexes if they do not exist yet.
///
/// Safe to run on every startup; existing rows are never touched.
fn initialize_schema(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS tickets (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL CHECK (length(trim(title)) > 0),
            description TEXT,
            priority INTEGER NOT NULL CHECK (priority BETWEEN 1 AND 5),
            status TEXT NOT NULL DEFAULT 'open'
                CHECK (status IN ('open', 'in_progress', 'closed'))
        );

        CREATE INDEX IF NOT EXISTS idx_tickets_status ON tickets(status);
        CREATE INDEX IF NOT EXISTS idx_tickets_priority ON tickets(priority);
        "#,
    )?;
    Ok(())
}

/// A scoped unit of work holding one connection.
pub struct Session {
    conn: Connection,
}

impl Session {
    /// Connection for single-statement operations.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Run `f` inside a write transaction.
    ///
    /// Commits when `f` returns `Ok`; any `Err` (or a panic) rolls back, so
    /// no partial write is ever visible.
    pub fn transaction<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, E>,
        E: From<StorageError>,
    {
        // IMMEDIATE takes the write lock up front, so a read-then-write unit
        // cannot fail halfway on a lock upgrade.
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(StorageError::from)?;
        let value = f(&tx)?;
        tx.commit().map_err(StorageError::from)?;
        Ok(value)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        trace!("Storage session closed");
    }
}

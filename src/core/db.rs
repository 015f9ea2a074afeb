//! Store construction and the embedded storage engine boundary.
//!
//! The backing engine is a single SQLite file with one table per
//! namespace. Each table is a plain ordered key/value space: `key TEXT
//! PRIMARY KEY, value TEXT`, where the value is the JSON-serialized
//! record. Everything the stores need from the engine is expressed
//! through this module: namespace creation, serialized transactions, and
//! forward key-ordered iteration.

use crate::core::error::{DriftlockError, Result};
use rusqlite::{Connection, ErrorCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

pub const DB_FILE_NAME: &str = "driftlock.db";

pub const LOCKS_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS locks (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    )
";
pub const PULLS_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS pulls (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    )
";

/// Handle to the open store. Constructed once at startup via [`Store::open`]
/// and passed explicitly to every caller; there is no hidden global.
///
/// The handle is `Send + Sync`. The single connection behind the mutex is
/// the serialization point for all transactions, which is what makes
/// check-then-write operations like lock acquisition atomic.
#[derive(Debug)]
pub struct Store {
    pub(crate) conn: Mutex<Connection>,
}

impl Store {
    /// Opens (creating if necessary) the store under `data_dir`.
    ///
    /// The database is held in exclusive locking mode, so a second process
    /// opening the same file fails here with a distinct error rather than
    /// silently sharing state.
    pub fn open(data_dir: &Path) -> Result<Store> {
        fs::create_dir_all(data_dir)?;
        let db_path = data_dir.join(DB_FILE_NAME);
        let conn = Connection::open(&db_path)
            .map_err(|e| DriftlockError::Open(format!("{}: {}", db_path.display(), e)))?;
        conn.busy_timeout(Duration::from_secs(1))?;
        // These pragmas echo their value back, so query_row instead of execute.
        conn.query_row("PRAGMA journal_mode=WAL;", [], |_| Ok(()))
            .map_err(|e| map_busy(e, &db_path))?;
        conn.query_row("PRAGMA locking_mode=EXCLUSIVE;", [], |_| Ok(()))
            .map_err(|e| map_busy(e, &db_path))?;

        // The first write takes the exclusive file lock and creates both
        // namespaces. A timeout here means another instance holds the file.
        conn.execute_batch(&format!("{};{};", LOCKS_SCHEMA, PULLS_SCHEMA))
            .map_err(|e| map_busy(e, &db_path))?;

        Ok(Store {
            conn: Mutex::new(conn),
        })
    }

    /// Explicitly closes the store. Dropping the handle has the same
    /// effect; this exists so shutdown paths can surface close errors.
    pub fn close(self) -> Result<()> {
        let conn = self.conn.into_inner().unwrap();
        conn.close().map_err(|(_, e)| DriftlockError::Storage(e))
    }
}

fn map_busy(e: rusqlite::Error, db_path: &Path) -> DriftlockError {
    match &e {
        rusqlite::Error::SqliteFailure(f, _)
            if f.code == ErrorCode::DatabaseBusy || f.code == ErrorCode::DatabaseLocked =>
        {
            DriftlockError::AlreadyOpen {
                path: PathBuf::from(db_path),
            }
        }
        _ => DriftlockError::Storage(e),
    }
}

/// Serializes a record for storage.
pub(crate) fn encode<T: Serialize>(record: &T) -> Result<String> {
    serde_json::to_string(record).map_err(DriftlockError::Encode)
}

/// Deserializes a stored value, naming the offending key on failure so
/// corruption is diagnosable without unrelated operations aborting.
pub(crate) fn decode<T: DeserializeOwned>(key: &str, raw: &str) -> Result<T> {
    serde_json::from_str(raw).map_err(|e| DriftlockError::Decode {
        key: key.to_string(),
        source: e,
    })
}

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DriftlockError {
    #[error(
        "opening store at {}: timed out waiting for the database lock (a possible cause is another driftlock instance already running)",
        .path.display()
    )]
    AlreadyOpen { path: PathBuf },
    #[error("opening store: {0}")]
    Open(String),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("DB transaction failed: {0}")]
    Storage(#[from] rusqlite::Error),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("deserializing record at key {key:?}: {source}")]
    Decode {
        key: String,
        source: serde_json::Error,
    },
    #[error("serializing record: {0}")]
    Encode(serde_json::Error),
    #[error("{context}: {source}")]
    BulkRelease {
        context: String,
        source: Box<DriftlockError>,
    },
}

pub type Result<T> = std::result::Result<T, DriftlockError>;

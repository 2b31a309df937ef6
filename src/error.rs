use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum DaedalusError {
    #[error("cannot accept both a run list and a skip list")]
    #[diagnostic(help("pass either --run or --skip, not both"))]
    ConflictingSelection,

    #[error("unknown runner: {0}")]
    UnknownRunner(String),

    #[error("invalid cache key: {0}")]
    InvalidCacheKey(String),

    #[error("cache snapshot at {0} is not a key-addressed collection")]
    #[diagnostic(help("use --regen-cache to force a redownload"))]
    SnapshotNotKeyed(PathBuf),

    #[error("cache snapshot at {path} is missing keys: {}", missing.join(", "))]
    #[diagnostic(help("use --regen-cache to force a redownload"))]
    SnapshotMissingKeys { path: PathBuf, missing: Vec<String> },

    #[error("cache snapshot error: {0}")]
    Snapshot(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("request to {url} failed: {message}")]
    FetchHttp { url: String, message: String },

    #[error("{url} returned status {status}: {message}")]
    FetchStatus {
        url: String,
        status: u16,
        message: String,
    },

    #[error("COSMIC authentication failed: {0}")]
    CosmicAuth(String),

    #[error("decompression failed: {0}")]
    Decompress(String),

    #[error("failed to parse {dataset}: {message}")]
    Parse { dataset: String, message: String },

    #[error("cache hook '{key}' failed: {message}")]
    HookFailed { key: String, message: String },

    #[error("{0}")]
    Transform(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("database already exists at {0}")]
    #[diagnostic(help("remove the old database or pick another output directory"))]
    DatabaseExists(PathBuf),

    #[error("database is not empty; the schema must be applied to an empty store")]
    StoreNotEmpty,

    #[error("schema script failed: {0}")]
    Schema(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("{} runner(s) failed: {}", failed.len(), failed.join(", "))]
    Aborted { failed: Vec<String> },
}

impl DaedalusError {
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            DaedalusError::ConflictingSelection
                | DaedalusError::UnknownRunner(_)
                | DaedalusError::InvalidCacheKey(_)
                | DaedalusError::SnapshotNotKeyed(_)
                | DaedalusError::SnapshotMissingKeys { .. }
                | DaedalusError::ConfigRead(_)
                | DaedalusError::ConfigParse(_)
                | DaedalusError::DatabaseExists(_)
        )
    }

    /// An unusable cache snapshot. Fatal for the whole pass, since every
    /// later read would hit the same file.
    pub fn is_snapshot(&self) -> bool {
        matches!(
            self,
            DaedalusError::SnapshotNotKeyed(_)
                | DaedalusError::SnapshotMissingKeys { .. }
                | DaedalusError::Snapshot(_)
        )
    }

    pub fn is_fetch(&self) -> bool {
        matches!(
            self,
            DaedalusError::FetchHttp { .. }
                | DaedalusError::FetchStatus { .. }
                | DaedalusError::CosmicAuth(_)
        )
    }
}

impl From<rusqlite::Error> for DaedalusError {
    fn from(err: rusqlite::Error) -> Self {
        DaedalusError::Database(err.to_string())
    }
}

//! Error types for cache operations.
//!
//! Every fallible operation on [`KvCache`](crate::KvCache) returns [`Error`].
//! Engine failures keep the underlying `rusqlite` error as their source so
//! callers can inspect the SQLite result code when they need to.

use std::path::PathBuf;

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed source for failures that may come from either the filesystem or SQLite.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Cache errors with structured context.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The backing file could not be opened or created.
    #[error("failed to open cache database {path:?}: {source}")]
    StorageOpen {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    /// The cache table could not be created or verified on open.
    #[error("failed to initialize table '{table}': {source}")]
    SchemaInit {
        table: String,
        #[source]
        source: rusqlite::Error,
    },

    /// No record exists for the key.
    #[error("key not found: {key}")]
    NotFound { key: String },

    /// A read statement failed in the engine.
    #[error("failed to read key '{key}': {source}")]
    StorageRead {
        key: String,
        #[source]
        source: rusqlite::Error,
    },

    /// A write statement failed in the engine.
    #[error("failed to write key '{key}': {source}")]
    StorageWrite {
        key: String,
        #[source]
        source: rusqlite::Error,
    },

    /// The engine rejected a write because the key already exists.
    #[error("key '{key}' violates the unique constraint")]
    UniqueConstraint {
        key: String,
        #[source]
        source: rusqlite::Error,
    },

    /// The key is longer than the configured limit.
    #[error("key is {len} characters, limit is {max}")]
    KeyTooLong { len: usize, max: usize },

    /// The handle was already closed.
    #[error("cache is closed")]
    StoreClosed,

    /// Releasing the connection failed.
    #[error("failed to close cache database: {0}")]
    StorageClose(#[source] rusqlite::Error),

    /// The cache configuration is unusable.
    #[error("invalid cache configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Create a storage open error.
    pub fn storage_open(path: impl Into<PathBuf>, source: impl Into<BoxError>) -> Self {
        Self::StorageOpen {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Create a not found error.
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create a read error.
    pub fn read(key: impl Into<String>, source: rusqlite::Error) -> Self {
        Self::StorageRead {
            key: key.into(),
            source,
        }
    }

    /// Create a write error, separating unique-constraint violations from
    /// other engine failures.
    pub fn write(key: impl Into<String>, source: rusqlite::Error) -> Self {
        let key = key.into();
        if is_unique_violation(&source) {
            Self::UniqueConstraint { key, source }
        } else {
            Self::StorageWrite { key, source }
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }

    /// Returns true if this is a [`Error::NotFound`].
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

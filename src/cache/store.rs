//! SQLite-backed `KvCache` handle.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, warn};

use super::schema::Statements;
use super::types::Record;
use crate::config::CacheConfig;
use crate::error::{Error, Result};

/// Persistent key-value cache stored in one SQLite table.
///
/// Each handle owns a single connection. All operations block until SQLite
/// returns. The handle is `Send` but not `Sync`; to share one across threads,
/// wrap it in a mutex, or open one handle per thread on the same file.
///
/// Once [`close`](Self::close) succeeds or fails, the handle is closed and
/// every other operation returns [`Error::StoreClosed`].
///
/// # Example
///
/// ```no_run
/// use kvcache::KvCache;
///
/// let mut cache = KvCache::open("cache.db")?;
/// cache.set("user:1001", "alice")?;
/// assert_eq!(cache.get("user:1001")?, "alice");
/// cache.close()?;
/// # Ok::<(), kvcache::Error>(())
/// ```
#[derive(Debug)]
pub struct KvCache {
    conn: Option<Connection>,
    path: PathBuf,
    config: CacheConfig,
    sql: Statements,
}

impl KvCache {
    /// Opens or creates a cache at `path` with the default configuration.
    ///
    /// # Errors
    ///
    /// See [`open_with`](Self::open_with).
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, CacheConfig::default())
    }

    /// Opens or creates a cache at `path`.
    ///
    /// Creates parent directories if needed, then creates the cache table if
    /// it does not exist. Opening an already initialized file is a no-op for
    /// the schema.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `config` does not validate ([`Error::InvalidConfig`])
    /// - The parent directory or database file cannot be opened or created
    ///   ([`Error::StorageOpen`])
    /// - The table cannot be created, or an existing table lacks a column or
    ///   the unique constraint on `key`, e.g. the file is not a database or
    ///   the name is taken by an index ([`Error::SchemaInit`])
    pub fn open_with<P: AsRef<Path>>(path: P, config: CacheConfig) -> Result<Self> {
        config.validate()?;
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::storage_open(path, e))?;
        }

        let conn = Connection::open(path).map_err(|e| Error::storage_open(path, e))?;
        Self::init(conn, path.to_path_buf(), config)
    }

    /// Opens a cache in a private in-memory database.
    ///
    /// Contents are lost when the handle is closed or dropped.
    ///
    /// # Errors
    ///
    /// Same as [`open_with`](Self::open_with), minus filesystem failures.
    pub fn open_in_memory(config: CacheConfig) -> Result<Self> {
        config.validate()?;
        let path = PathBuf::from(":memory:");
        let conn = Connection::open_in_memory().map_err(|e| Error::storage_open(&path, e))?;
        Self::init(conn, path, config)
    }

    fn init(conn: Connection, path: PathBuf, config: CacheConfig) -> Result<Self> {
        if let Some(timeout) = config.busy_timeout() {
            conn.busy_timeout(timeout)
                .map_err(|e| Error::storage_open(&path, e))?;
        }

        let sql = Statements::new(&config.table);
        let schema_err = |source| Error::SchemaInit {
            table: config.table.clone(),
            source,
        };
        conn.execute_batch(&sql.create_table).map_err(schema_err)?;

        // An existing table is kept as-is; every statement must compile
        // against it, which checks the columns and the unique index on key.
        for stmt in sql.runtime() {
            conn.prepare_cached(stmt).map_err(schema_err)?;
        }

        debug!(path = %path.display(), table = %config.table, "cache opened");

        Ok(Self {
            conn: Some(conn),
            path,
            config,
            sql,
        })
    }

    /// Path of the backing database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Configuration the handle was opened with.
    #[must_use]
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Returns true once [`close`](Self::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.conn.is_none()
    }

    fn conn(&self) -> Result<&Connection> {
        self.conn.as_ref().ok_or(Error::StoreClosed)
    }

    fn now(&self) -> String {
        Local::now().format(&self.config.timestamp_format).to_string()
    }

    /// Retrieves the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no record has the key,
    /// [`Error::StorageRead`] if the lookup fails, or
    /// [`Error::StoreClosed`] after close.
    pub fn get(&self, key: &str) -> Result<String> {
        let conn = self.conn()?;
        let value = conn
            .prepare_cached(&self.sql.select_value)
            .and_then(|mut stmt| stmt.query_row([key], |row| row.get::<_, String>(0)).optional())
            .map_err(|e| Error::read(key, e))?;

        value.ok_or_else(|| Error::not_found(key))
    }

    /// Retrieves the full record stored under `key`, timestamps included.
    ///
    /// # Errors
    ///
    /// Same as [`get`](Self::get).
    pub fn record(&self, key: &str) -> Result<Record> {
        let conn = self.conn()?;
        let record = conn
            .prepare_cached(&self.sql.select_record)
            .and_then(|mut stmt| stmt.query_row([key], Record::from_row).optional())
            .map_err(|e| Error::read(key, e))?;

        record.ok_or_else(|| Error::not_found(key))
    }

    /// Inserts `key` or updates its value, returning the rows affected.
    ///
    /// A new key gets a fresh id and both timestamps set to now. An existing
    /// key keeps its id and `create_time`; `value` is replaced and
    /// `update_time` advances to now, or stays put if the stored time is
    /// later (clock stepped back). Both paths run as one upsert statement, so concurrent
    /// writers cannot race between an existence check and the write.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The handle is closed ([`Error::StoreClosed`])
    /// - The key exceeds `max_key_len` characters ([`Error::KeyTooLong`])
    /// - The engine reports a unique violation ([`Error::UniqueConstraint`])
    /// - Any other write failure ([`Error::StorageWrite`])
    pub fn set(&self, key: &str, value: &str) -> Result<u64> {
        let conn = self.conn()?;

        let len = key.chars().count();
        if len > self.config.max_key_len {
            return Err(Error::KeyTooLong {
                len,
                max: self.config.max_key_len,
            });
        }

        let now = self.now();
        let rows = conn
            .prepare_cached(&self.sql.upsert)
            .and_then(|mut stmt| stmt.execute(params![key, value, now]))
            .map_err(|e| Error::write(key, e))?;

        debug!(key, rows, "cache set");
        Ok(rows as u64)
    }

    /// Deletes `key`, returning 1 if a record was removed and 0 if the key
    /// was absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageWrite`] if the delete fails, or
    /// [`Error::StoreClosed`] after close.
    pub fn del(&self, key: &str) -> Result<u64> {
        let conn = self.conn()?;
        let rows = conn
            .prepare_cached(&self.sql.delete)
            .and_then(|mut stmt| stmt.execute([key]))
            .map_err(|e| Error::write(key, e))?;

        debug!(key, rows, "cache del");
        Ok(rows as u64)
    }

    /// Checks whether a record exists for `key`, reporting failures.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageRead`] if the lookup fails, or
    /// [`Error::StoreClosed`] after close.
    pub fn try_has_key(&self, key: &str) -> Result<bool> {
        let conn = self.conn()?;
        let count = conn
            .prepare_cached(&self.sql.count_key)
            .and_then(|mut stmt| stmt.query_row([key], |row| row.get::<_, i64>(0)))
            .map_err(|e| Error::read(key, e))?;

        Ok(count > 0)
    }

    /// Checks whether a record exists for `key`.
    ///
    /// Never fails: a closed handle or a failed lookup reports the key as
    /// absent and logs the cause at `warn`. Use
    /// [`try_has_key`](Self::try_has_key) to tell the two apart.
    #[must_use]
    pub fn has_key(&self, key: &str) -> bool {
        match self.try_has_key(key) {
            Ok(found) => found,
            Err(e) => {
                warn!(key, error = %e, "existence check failed, reporting key as absent");
                false
            },
        }
    }

    /// Closes the connection.
    ///
    /// The handle is closed afterwards even if SQLite reports a failure; the
    /// connection is dropped in that case.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageClose`] if SQLite fails to close the
    /// connection, or [`Error::StoreClosed`] if the handle was already closed.
    pub fn close(&mut self) -> Result<()> {
        let conn = self.conn.take().ok_or(Error::StoreClosed)?;

        if let Err((_conn, e)) = conn.close() {
            warn!(path = %self.path.display(), error = %e, "failed to close cache database");
            return Err(Error::StorageClose(e));
        }

        debug!(path = %self.path.display(), "cache closed");
        Ok(())
    }
}

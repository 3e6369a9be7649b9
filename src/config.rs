//! Configuration for a [`KvCache`](crate::KvCache).
//!
//! [`CacheConfig`] replaces what used to be process-wide constants (table
//! name, timestamp format) with fields on the handle. The defaults match the
//! legacy layout, so a store opened with `CacheConfig::default()` reads and
//! writes files produced by earlier versions.
//!
//! Configuration can be built in code or loaded from a TOML file:
//!
//! ```toml
//! table = "key_value"
//! timestamp_format = "%Y-%m-%d %H:%M:%S"
//! max_key_len = 128
//! busy_timeout_ms = 5000
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use chrono::format::{Item, StrftimeItems};
use serde::Deserialize;

use crate::constants;
use crate::error::{Error, Result};

/// Settings for one cache handle.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Name of the table holding cache records.
    #[serde(default = "default_table")]
    pub table: String,

    /// `strftime`-style format used for `create_time` and `update_time`.
    /// `update_time` only moves forward if the format sorts as text in time
    /// order, as the default does.
    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: String,

    /// Keys longer than this many characters are rejected by `set`.
    #[serde(default = "default_max_key_len")]
    pub max_key_len: usize,

    /// How long a statement waits on a locked database before failing.
    /// `None` keeps SQLite's default (fail immediately).
    #[serde(default)]
    pub busy_timeout_ms: Option<u64>,
}

fn default_table() -> String {
    constants::DEFAULT_TABLE.to_string()
}

fn default_timestamp_format() -> String {
    constants::DEFAULT_TIMESTAMP_FORMAT.to_string()
}

fn default_max_key_len() -> usize {
    constants::MAX_KEY_LEN
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            table: default_table(),
            timestamp_format: default_timestamp_format(),
            max_key_len: default_max_key_len(),
            busy_timeout_ms: None,
        }
    }
}

impl CacheConfig {
    /// Load configuration from a TOML file.
    ///
    /// Missing fields take their defaults. The result is not validated;
    /// [`KvCache::open_with`](crate::KvCache::open_with) does that.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read (IO error)
    /// - The file contains invalid TOML syntax
    /// - A field has the wrong type or is unknown
    pub fn load_from<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: CacheConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Use a different table name.
    #[must_use]
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Use a different timestamp format.
    #[must_use]
    pub fn with_timestamp_format(mut self, format: impl Into<String>) -> Self {
        self.timestamp_format = format.into();
        self
    }

    /// Use a different key length limit.
    #[must_use]
    pub fn with_max_key_len(mut self, max: usize) -> Self {
        self.max_key_len = max;
        self
    }

    /// Wait up to `timeout` on a locked database.
    ///
    /// Timeouts longer than SQLite accepts (about 24.8 days) are clamped.
    #[must_use]
    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        let millis = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self.busy_timeout_ms = Some(millis.min(constants::MAX_BUSY_TIMEOUT_MS));
        self
    }

    /// The busy timeout as a [`Duration`], if set.
    #[must_use]
    pub fn busy_timeout(&self) -> Option<Duration> {
        self.busy_timeout_ms.map(Duration::from_millis)
    }

    /// Check that the configuration can be used to open a cache.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if:
    /// - The table name is not a plain SQL identifier
    /// - The timestamp format is empty or not a valid `strftime` format
    /// - The key length limit is zero
    /// - The busy timeout does not fit SQLite's millisecond `int`
    pub fn validate(&self) -> Result<()> {
        if !is_identifier(&self.table) {
            return Err(Error::invalid_config(format!(
                "table name '{}' must be ASCII letters, digits or '_' and not start with a digit",
                self.table
            )));
        }

        if self.timestamp_format.is_empty() {
            return Err(Error::invalid_config("timestamp_format cannot be empty"));
        }
        if StrftimeItems::new(&self.timestamp_format).any(|item| matches!(item, Item::Error)) {
            return Err(Error::invalid_config(format!(
                "timestamp_format '{}' is not a valid strftime format",
                self.timestamp_format
            )));
        }

        if self.max_key_len == 0 {
            return Err(Error::invalid_config("max_key_len must be greater than 0"));
        }

        if let Some(ms) = self.busy_timeout_ms
            && ms > constants::MAX_BUSY_TIMEOUT_MS
        {
            return Err(Error::invalid_config(format!(
                "busy_timeout_ms {ms} exceeds the maximum of {}",
                constants::MAX_BUSY_TIMEOUT_MS
            )));
        }

        Ok(())
    }
}

/// Table names are interpolated into SQL, so only plain identifiers pass.
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {},
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

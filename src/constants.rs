//! Default values for cache configuration.

/// Table holding cache records.
pub const DEFAULT_TABLE: &str = "key_value";

/// Text format of `create_time` and `update_time` (`YYYY-MM-DD HH:MM:SS`).
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Maximum key length in characters, matching the `VARCHAR(128)` column.
pub const MAX_KEY_LEN: usize = 128;

/// Largest busy timeout SQLite accepts, in milliseconds (a C `int`).
pub const MAX_BUSY_TIMEOUT_MS: u64 = i32::MAX as u64;

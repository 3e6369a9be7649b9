//! Persistent key-value cache backed by a single SQLite table.
//!
//! - [`KvCache`] - the cache handle: `get`, `set`, `del`, `has_key`, `close`
//! - [`CacheConfig`] - table name, timestamp format and limits, loadable from TOML
//! - [`Error`] - every failure a cache operation can report
//!
//! The API is synchronous. `set` is a single upsert statement, so two handles
//! writing the same new key cannot trip the unique constraint on `key`.

pub mod cache;
pub mod config;
pub mod constants;
pub mod error;

pub use cache::{KvCache, Record};
pub use config::CacheConfig;
pub use error::{Error, Result};

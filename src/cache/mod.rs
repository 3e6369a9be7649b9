//! Key-value cache stored in a single SQLite table.
//!
//! Each record maps a unique text key to a text value and carries the time it
//! was created and last updated:
//!
//! ```text
//! key_value (
//!   id          INTEGER PRIMARY KEY AUTOINCREMENT,
//!   key         VARCHAR(128) UNIQUE,
//!   value       TEXT,
//!   create_time TIMESTAMP DEFAULT (DATETIME('now', 'localtime')),
//!   update_time TIMESTAMP DEFAULT (DATETIME('now', 'localtime'))
//! )
//! ```
//!
//! # Example
//!
//! ```no_run
//! use kvcache::{CacheConfig, KvCache};
//!
//! let mut cache = KvCache::open_with("data/cache.db", CacheConfig::default())?;
//! assert_eq!(cache.set("a", "1")?, 1);
//! assert_eq!(cache.get("a")?, "1");
//! assert_eq!(cache.del("a")?, 1);
//! assert!(cache.get("a").unwrap_err().is_not_found());
//! cache.close()?;
//! # Ok::<(), kvcache::Error>(())
//! ```

mod schema;
mod store;
mod types;


pub use store::KvCache;
pub use types::Record;

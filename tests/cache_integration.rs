//! Integration tests for the public cache API.
//!
//! Exercises the cache the way an embedding application would: through the
//! crate root, against real files, across handles and threads.

use std::sync::Arc;
use std::sync::Barrier;
use std::thread;
use std::time::Duration;

use kvcache::{CacheConfig, Error, KvCache};
use tempfile::TempDir;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// =============================================================================
// Lifecycle
// =============================================================================

#[test]
fn test_full_lifecycle_scenario() {
    init_tracing();
    let tmp = TempDir::new().unwrap();
    let mut cache = KvCache::open(tmp.path().join("cache.db")).unwrap();

    assert_eq!(cache.set("a", "1").unwrap(), 1);
    assert_eq!(cache.get("a").unwrap(), "1");
    assert_eq!(cache.set("a", "2").unwrap(), 1);
    assert_eq!(cache.get("a").unwrap(), "2");
    assert_eq!(cache.del("a").unwrap(), 1);
    assert!(matches!(cache.get("a"), Err(Error::NotFound { .. })));
    assert_eq!(cache.del("a").unwrap(), 0);

    cache.close().unwrap();
}

#[test]
fn test_values_persist_across_reopen() {
    init_tracing();
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("cache.db");

    let mut cache = KvCache::open(&path).unwrap();
    cache.set("user:1001", "alice").unwrap();
    cache.set("user:1002", "bob").unwrap();
    cache.del("user:1002").unwrap();
    let created = cache.record("user:1001").unwrap();
    cache.close().unwrap();

    let mut reopened = KvCache::open(&path).unwrap();
    assert_eq!(reopened.get("user:1001").unwrap(), "alice");
    assert!(!reopened.has_key("user:1002"));
    assert_eq!(reopened.record("user:1001").unwrap(), created);
    reopened.close().unwrap();
}

#[test]
fn test_drop_without_close_persists() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("cache.db");

    {
        let cache = KvCache::open(&path).unwrap();
        cache.set("k", "v").unwrap();
    }

    let cache = KvCache::open(&path).unwrap();
    assert_eq!(cache.get("k").unwrap(), "v");
}

#[test]
fn test_config_loaded_from_toml() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("cache.toml");
    std::fs::write(
        &config_path,
        "table = \"sessions\"\nmax_key_len = 8\nbusy_timeout_ms = 2000\n",
    )
    .unwrap();

    let config = CacheConfig::load_from(&config_path).unwrap();
    let cache = KvCache::open_with(tmp.path().join("cache.db"), config).unwrap();

    assert_eq!(cache.config().table, "sessions");
    cache.set("short", "ok").unwrap();
    assert!(matches!(
        cache.set("much-too-long", "no"),
        Err(Error::KeyTooLong { max: 8, .. })
    ));
}

// =============================================================================
// Multiple handles
// =============================================================================

#[test]
fn test_second_handle_sees_writes() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("cache.db");

    let writer = KvCache::open(&path).unwrap();
    let reader = KvCache::open(&path).unwrap();

    writer.set("shared", "1").unwrap();
    assert_eq!(reader.get("shared").unwrap(), "1");

    // The reader inserting the same key updates the existing record
    assert_eq!(reader.set("shared", "2").unwrap(), 1);
    assert_eq!(writer.get("shared").unwrap(), "2");
}

#[test]
fn test_concurrent_sets_of_new_keys_do_not_conflict() {
    init_tracing();
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("cache.db");
    let config = CacheConfig::default().with_busy_timeout(Duration::from_secs(10));

    // Create the schema once before the writers race
    KvCache::open_with(&path, config.clone()).unwrap();

    const WRITERS: usize = 4;
    const KEYS: usize = 50;
    let barrier = Arc::new(Barrier::new(WRITERS));

    let handles: Vec<_> = (0..WRITERS)
        .map(|writer| {
            let path = path.clone();
            let config = config.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let cache = KvCache::open_with(&path, config).unwrap();
                barrier.wait();
                for i in 0..KEYS {
                    let rows = cache.set(&format!("key:{i}"), &format!("writer-{writer}")).unwrap();
                    assert_eq!(rows, 1);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let cache = KvCache::open(&path).unwrap();
    for i in 0..KEYS {
        let value = cache.get(&format!("key:{i}")).unwrap();
        assert!(value.starts_with("writer-"), "unexpected value {value}");
    }
}

#[test]
fn test_shared_handle_behind_mutex() {
    let tmp = TempDir::new().unwrap();
    let cache = Arc::new(std::sync::Mutex::new(
        KvCache::open(tmp.path().join("cache.db")).unwrap(),
    ));

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for i in 0..25 {
                    let cache = cache.lock().unwrap();
                    cache.set(&format!("t{t}:{i}"), "v").unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let cache = cache.lock().unwrap();
    for t in 0..4 {
        for i in 0..25 {
            assert!(cache.has_key(&format!("t{t}:{i}")));
        }
    }
}

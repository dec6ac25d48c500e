//! A TTL-bounded key/value side-store, orthogonal to query serving (spec §1,
//! §6 `kv_get`/`kv_set`).
//!
//! Source re-architecting note: `original_source/core/ttl_dict.py`'s
//! `TTLDictionary` backs this with a SQLite table and wall-clock
//! `datetime` comparisons, polled by a separate `expiration_loop` coroutine.
//! Here the table is an in-memory map guarded by a `parking_lot::Mutex`
//! (following the same short-critical-section discipline as
//! `index_catalog::Catalog`) and expiry uses a monotonic [`std::time::Instant`]
//! rather than wall-clock time, which sidesteps clock-skew entirely for a
//! purely relative TTL. [`KvStore::run_expiration_loop`] is the async
//! equivalent of `start_expiration_loop`.
#![warn(missing_docs, missing_debug_implementations)]

mod error;

pub use error::Error;

use observability_deps::tracing::debug;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

struct Entry {
    value: String,
    expires_at: Instant,
}

/// An in-memory, TTL-bounded string-to-string map.
#[derive(Debug)]
pub struct KvStore {
    entries: Mutex<HashMap<String, Entry>>,
    default_ttl: Duration,
}

impl KvStore {
    /// A new, empty store. `default_ttl` is used by [`KvStore::set`] calls
    /// that don't specify one explicitly.
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            default_ttl,
        }
    }

    /// Insert or replace `key`'s value, expiring after `ttl` (or the store's
    /// default).
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>, ttl: Option<Duration>) {
        let expires_at = Instant::now() + ttl.unwrap_or(self.default_ttl);
        self.entries.lock().insert(
            key.into(),
            Entry {
                value: value.into(),
                expires_at,
            },
        );
    }

    /// The value for `key`, if it exists and has not expired. An expired
    /// entry is removed as a side effect, matching `__getitem__`'s lazy
    /// cleanup.
    pub fn get(&self, key: &str) -> Result<String, Error> {
        let mut guard = self.entries.lock();
        match guard.get(key) {
            Some(entry) if entry.expires_at >= Instant::now() => Ok(entry.value.clone()),
            Some(_) => {
                guard.remove(key);
                error::NotFoundSnafu { key: key.to_string() }.fail()
            }
            None => error::NotFoundSnafu { key: key.to_string() }.fail(),
        }
    }

    /// `true` if `key` has a live, unexpired entry.
    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .lock()
            .get(key)
            .map_or(false, |entry| entry.expires_at >= Instant::now())
    }

    /// Remove `key`. Fails with [`Error::NotFound`] if it had no live entry.
    pub fn delete(&self, key: &str) -> Result<(), Error> {
        let mut guard = self.entries.lock();
        match guard.get(key) {
            Some(entry) if entry.expires_at >= Instant::now() => {
                guard.remove(key);
                Ok(())
            }
            _ => error::NotFoundSnafu { key: key.to_string() }.fail(),
        }
    }

    /// Every key with a live entry, in unspecified order.
    pub fn keys(&self) -> Vec<String> {
        let now = Instant::now();
        self.entries
            .lock()
            .iter()
            .filter(|(_, entry)| entry.expires_at >= now)
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Discard every entry.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Remove every expired entry in a single pass, returning the count
    /// removed. The async equivalent of `expiration_loop`'s per-tick
    /// `DELETE ... WHERE expires_at < ?`.
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let mut guard = self.entries.lock();
        let before = guard.len();
        guard.retain(|_, entry| entry.expires_at >= now);
        let removed = before - guard.len();
        if removed > 0 {
            debug!(removed, "swept expired kv entries");
        }
        removed
    }

    /// Sweep expired entries every `period`, forever. Spawned as a
    /// background task by the server binary (`start_expiration_loop` in the
    /// source prototype ran this as its own thread via `asyncio.run`).
    pub async fn run_expiration_loop(&self, period: Duration) -> ! {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            self.sweep_expired();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_round_trips() {
        let store = KvStore::new(Duration::from_secs(60));
        store.set("a", "1", None);
        assert_eq!(store.get("a").unwrap(), "1");
    }

    #[test]
    fn missing_key_fails() {
        let store = KvStore::new(Duration::from_secs(60));
        let err = store.get("missing").unwrap_err();
        assert_eq!(err, Error::NotFound { key: "missing".to_string() });
    }

    #[test]
    fn expired_entry_is_treated_as_missing() {
        let store = KvStore::new(Duration::from_millis(0));
        store.set("a", "1", Some(Duration::from_millis(0)));
        std::thread::sleep(Duration::from_millis(5));
        assert!(store.get("a").is_err());
        assert!(!store.contains("a"));
    }

    #[test]
    fn delete_removes_a_live_entry() {
        let store = KvStore::new(Duration::from_secs(60));
        store.set("a", "1", None);
        store.delete("a").unwrap();
        assert!(store.get("a").is_err());
    }

    #[test]
    fn delete_missing_key_fails() {
        let store = KvStore::new(Duration::from_secs(60));
        assert!(store.delete("missing").is_err());
    }

    #[test]
    fn sweep_expired_removes_only_expired_entries() {
        let store = KvStore::new(Duration::from_secs(60));
        store.set("keep", "1", None);
        store.set("drop", "2", Some(Duration::from_millis(0)));
        std::thread::sleep(Duration::from_millis(5));

        let removed = store.sweep_expired();
        assert_eq!(removed, 1);
        assert!(store.contains("keep"));
        assert!(!store.contains("drop"));
    }

    #[test]
    fn keys_excludes_expired_entries() {
        let store = KvStore::new(Duration::from_secs(60));
        store.set("keep", "1", None);
        store.set("drop", "2", Some(Duration::from_millis(0)));
        std::thread::sleep(Duration::from_millis(5));

        assert_eq!(store.keys(), vec!["keep".to_string()]);
    }
}

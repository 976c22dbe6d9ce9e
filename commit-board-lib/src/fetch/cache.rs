//! An in-memory response cache with per-entry TTLs.
//!
//! [`Cache`] stores immutable JSON snapshots keyed by a string that encodes the
//! shape of the API call. Entries expire lazily: an expired entry is simply
//! ignored on lookup and replaced on the next successful fetch.

use super::Clock;
use crate::Result;
use chrono::{DateTime, Utc};
use core::time::Duration;
use ohno::IntoAppError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

const LOG_TARGET: &str = "     cache";

/// A single cached value. Never mutated once written.
#[derive(Debug)]
struct CacheEntry {
    value: serde_json::Value,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl CacheEntry {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// A TTL-aware, process-wide response cache.
///
/// Cloning a `Cache` yields another handle onto the same store.
#[derive(Debug, Clone)]
pub struct Cache {
    entries: Arc<Mutex<HashMap<String, Arc<CacheEntry>>>>,
    clock: Arc<dyn Clock>,
}

impl Cache {
    /// Create an empty cache that judges expiry using `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Arc::default(),
            clock,
        }
    }

    /// Look up a fresh entry and decode it as `T`.
    ///
    /// Returns `None` when the key is missing, expired, or holds a value of a different shape.
    #[must_use]
    pub fn get<T>(&self, key: &str) -> Option<T>
    where
        T: DeserializeOwned,
    {
        let entry = self.entries.lock().expect("lock not poisoned").get(key).cloned();

        let Some(entry) = entry else {
            log::trace!(target: LOG_TARGET, "Cache miss for {key}");
            return None;
        };

        let now = self.clock.now();
        if !entry.is_fresh(now) {
            log::debug!(
                target: LOG_TARGET,
                "Cache expired for {key} (stored {}s ago)",
                (now - entry.created_at).num_seconds()
            );
            return None;
        }

        match serde_json::from_value::<T>(entry.value.clone()) {
            Ok(value) => {
                log::debug!(target: LOG_TARGET, "Cache hit for {key}");
                Some(value)
            }
            Err(e) => {
                log::debug!(target: LOG_TARGET, "Cache miss for {key}: {e:#}");
                None
            }
        }
    }

    /// Store `value` under `key` for `ttl`, replacing any previous entry.
    pub fn set<T>(&self, key: &str, value: &T, ttl: Duration) -> Result<()>
    where
        T: Serialize,
    {
        let value = serde_json::to_value(value).into_app_err_with(|| format!("serializing cache entry '{key}'"))?;

        let created_at = self.clock.now();
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| created_at.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let entry = Arc::new(CacheEntry {
            value,
            created_at,
            expires_at,
        });

        let _ = self.entries.lock().expect("lock not poisoned").insert(key.to_string(), entry);
        Ok(())
    }

    /// Number of stored entries, including expired ones not yet purged.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().expect("lock not poisoned").len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.lock().expect("lock not poisoned").clear();
    }

    /// Drop expired entries, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.lock().expect("lock not poisoned");
        let before = entries.len();
        entries.retain(|_, entry| entry.is_fresh(now));
        before - entries.len()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::fetch::ManualClock;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
    struct TestData {
        name: String,
        value: u64,
    }

    fn make_cache() -> (Cache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(DateTime::from_timestamp(1_700_000_000, 0).unwrap()));
        (Cache::new(Arc::clone(&clock) as Arc<dyn Clock>), clock)
    }

    #[test]
    fn set_and_get() {
        let (cache, _) = make_cache();
        let data = TestData { name: "test".to_string(), value: 42 };

        cache.set("item", &data, Duration::from_secs(60)).unwrap();

        assert_eq!(cache.get::<TestData>("item"), Some(data));
    }

    #[test]
    fn missing_key_is_none() {
        let (cache, _) = make_cache();
        assert_eq!(cache.get::<TestData>("nope"), None);
    }

    #[test]
    fn entry_expires_after_ttl() {
        let (cache, clock) = make_cache();
        cache.set("item", &1u64, Duration::from_secs(60)).unwrap();

        clock.advance(Duration::from_secs(59));
        assert_eq!(cache.get::<u64>("item"), Some(1));

        clock.advance(Duration::from_secs(1));
        assert_eq!(cache.get::<u64>("item"), None);
    }

    #[test]
    fn zero_ttl_is_never_fresh() {
        let (cache, _) = make_cache();
        cache.set("item", &1u64, Duration::ZERO).unwrap();
        assert_eq!(cache.get::<u64>("item"), None);
    }

    #[test]
    fn shape_mismatch_is_a_miss() {
        let (cache, _) = make_cache();
        cache.set("item", &"a string", Duration::from_secs(60)).unwrap();
        assert_eq!(cache.get::<TestData>("item"), None);
    }

    #[test]
    fn set_replaces_existing() {
        let (cache, _) = make_cache();
        cache.set("item", &TestData { name: "first".to_string(), value: 1 }, Duration::from_secs(60)).unwrap();
        cache.set("item", &TestData { name: "second".to_string(), value: 2 }, Duration::from_secs(60)).unwrap();

        assert_eq!(cache.get::<TestData>("item").unwrap().name, "second");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn clones_share_the_store() {
        let (cache, _) = make_cache();
        let other = cache.clone();

        other.set("item", &7u64, Duration::from_secs(60)).unwrap();

        assert_eq!(cache.get::<u64>("item"), Some(7));
    }

    #[test]
    fn purge_expired_removes_only_stale_entries() {
        let (cache, clock) = make_cache();
        cache.set("short", &1u64, Duration::from_secs(10)).unwrap();
        cache.set("long", &2u64, Duration::from_secs(100)).unwrap();

        clock.advance(Duration::from_secs(30));

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get::<u64>("long"), Some(2));
    }

    #[test]
    fn clear_empties_the_cache() {
        let (cache, _) = make_cache();
        cache.set("a", &1u64, Duration::from_secs(10)).unwrap();
        cache.set("b", &2u64, Duration::from_secs(10)).unwrap();
        assert!(!cache.is_empty());

        cache.clear();

        assert!(cache.is_empty());
    }
}

//! Process-wide TTL cache shared by the availability gateway and the
//! sobreturno allocator. Entries expire lazily: a read past the TTL removes
//! the entry and reports a miss; there is no background sweeper.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

struct CacheEntry {
    value: Value,
    stored_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.stored_at) > self.ttl
    }
}

/// Shared in-memory cache. Clone-free: hold it behind an `Arc`.
pub struct TtlCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl TtlCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let value = match serde_json::to_value(value) {
            Ok(v) => v,
            Err(e) => {
                // Unserializable values are simply not cached.
                debug!("Skipping cache set for {}: {}", key, e);
                return;
            }
        };
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                stored_at: Instant::now(),
                ttl,
            },
        );
    }

    pub fn set_default<T: Serialize>(&self, key: &str, value: &T) {
        self.set(key, value, DEFAULT_TTL);
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        let entry = entries.get(key)?;

        if entry.is_expired(Instant::now()) {
            entries.remove(key);
            return None;
        }

        serde_json::from_value(entry.value.clone()).ok()
    }

    pub fn has(&self, key: &str) -> bool {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        match entries.get(key) {
            Some(entry) if entry.is_expired(Instant::now()) => {
                entries.remove(key);
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    pub fn delete(&self, key: &str) {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        entries.remove(key);
    }

    pub fn clear(&self) {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        entries.clear();
    }

    /// Live keys. Expired entries found along the way are purged.
    pub fn keys(&self) -> Vec<String> {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        let now = Instant::now();
        entries.retain(|_, entry| !entry.is_expired(now));
        entries.keys().cloned().collect()
    }
}

impl Default for TtlCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_returns_value() {
        let cache = TtlCache::new();
        cache.set_default("k", &vec!["a".to_string(), "b".to_string()]);

        let got: Option<Vec<String>> = cache.get("k");
        assert_eq!(got, Some(vec!["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn get_on_missing_key_is_none() {
        let cache = TtlCache::new();
        let got: Option<String> = cache.get("nope");
        assert!(got.is_none());
    }

    #[tokio::test]
    async fn expired_entry_is_removed_on_get() {
        let cache = TtlCache::new();
        cache.set("k", &1u32, Duration::from_millis(10));

        tokio::time::sleep(Duration::from_millis(30)).await;

        let got: Option<u32> = cache.get("k");
        assert!(got.is_none());
        assert!(cache.keys().is_empty());
    }

    #[tokio::test]
    async fn keys_purges_expired_entries() {
        let cache = TtlCache::new();
        cache.set("short", &1u32, Duration::from_millis(10));
        cache.set("long", &2u32, Duration::from_secs(60));

        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(cache.keys(), vec!["long".to_string()]);
    }

    #[test]
    fn delete_and_clear() {
        let cache = TtlCache::new();
        cache.set_default("a", &1u32);
        cache.set_default("b", &2u32);

        cache.delete("a");
        assert!(!cache.has("a"));
        assert!(cache.has("b"));

        cache.clear();
        assert!(cache.keys().is_empty());
    }
}

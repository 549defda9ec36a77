use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

/// Entries older than this are treated as absent on the next read.
pub const CACHE_TTL_SECONDS: i64 = 5 * 60;

#[derive(Debug, Clone)]
struct CacheEntry<T> {
    value: T,
    created_at: DateTime<Utc>,
}

/// Generic string-keyed store with a fixed time-to-live, backing the
/// auxiliary lookups (game search, category and variable listings).
///
/// Staleness is only checked on read; the read that finds a stale key evicts
/// it. There is no background sweep: the key space is bounded by the distinct
/// queries a session issues, so growth under pathological query diversity is
/// an accepted limitation.
#[derive(Debug)]
pub struct TtlCache<T> {
    entries: Mutex<HashMap<String, CacheEntry<T>>>,
    ttl: Duration,
}

impl<T: Clone> TtlCache<T> {
    pub fn new() -> Self {
        Self::with_ttl(Duration::seconds(CACHE_TTL_SECONDS))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn get(&self, key: &str) -> Option<T> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some(entry) if Utc::now() - entry.created_at <= self.ttl => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn set(&self, key: impl Into<String>, value: T) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(
            key.into(),
            CacheEntry {
                value,
                created_at: Utc::now(),
            },
        );
    }
}

impl<T: Clone> Default for TtlCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_count<T>(cache: &TtlCache<T>) -> usize {
        cache.entries.lock().unwrap().len()
    }

    #[test]
    fn stores_and_returns_fresh_entries() {
        let cache = TtlCache::new();
        cache.set("games:search:silksong", vec!["y65r341e".to_string()]);
        assert_eq!(
            cache.get("games:search:silksong"),
            Some(vec!["y65r341e".to_string()])
        );
    }

    #[test]
    fn missing_keys_are_absent() {
        let cache: TtlCache<u32> = TtlCache::new();
        assert_eq!(cache.get("category:nope"), None);
    }

    #[test]
    fn overwriting_replaces_the_value() {
        let cache = TtlCache::new();
        cache.set("game:y65r341e", 1);
        cache.set("game:y65r341e", 2);
        assert_eq!(cache.get("game:y65r341e"), Some(2));
    }

    #[test]
    fn expired_entries_are_evicted_on_read() {
        let cache = TtlCache::with_ttl(Duration::milliseconds(5));
        cache.set("variables:xd1mpewl", 7);
        std::thread::sleep(std::time::Duration::from_millis(10));
        assert_eq!(cache.get("variables:xd1mpewl"), None);
        // The stale read removed the key, not just hid it.
        assert_eq!(entry_count(&cache), 0);
    }

    #[test]
    fn unread_stale_entries_stay_in_the_map() {
        let cache = TtlCache::with_ttl(Duration::milliseconds(5));
        cache.set("categories:y65r341e", 1);
        std::thread::sleep(std::time::Duration::from_millis(10));
        // No sweep: nothing happens until a read touches the key.
        assert_eq!(entry_count(&cache), 1);
    }
}

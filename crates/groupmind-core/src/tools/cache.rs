//! TTL cache with a fixed capacity.
//!
//! Entries expire `ttl` after insertion. When the cache is full, inserting a
//! new key evicts the oldest insertion (not LRU: reads do not refresh
//! position). A zero TTL or zero capacity disables the cache entirely, so
//! lookups always miss and inserts are dropped. An expiry past the end of
//! the representable time range means the entry never expires.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};

use crate::clock::Clock;

/// Upper bound applied by [`ttl_from_secs`]: ten years.
pub const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// TTL for a configured number of seconds, clamped to [`MAX_TTL_SECS`].
pub fn ttl_from_secs(secs: u64) -> Duration {
    // The clamp keeps the value well inside i64 seconds.
    Duration::seconds(secs.min(MAX_TTL_SECS) as i64)
}

struct CacheEntry<V> {
    value: V,
    /// `None` never expires.
    expires_at: Option<DateTime<Utc>>,
}

impl<V> CacheEntry<V> {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|at| now <= at)
    }
}

struct CacheState<V> {
    entries: HashMap<String, CacheEntry<V>>,
    /// Keys in insertion order; front is the eviction candidate.
    order: VecDeque<String>,
}

/// Process-local cache shared by concurrent callers.
pub struct TtlCache<V> {
    ttl: Duration,
    capacity: usize,
    clock: Arc<dyn Clock>,
    state: Mutex<CacheState<V>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration, capacity: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            capacity,
            clock,
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.ttl > Duration::zero() && self.capacity > 0
    }

    /// Live value for `key`. An expired entry is removed and reported as a miss.
    pub fn get(&self, key: &str) -> Option<V> {
        if !self.is_enabled() {
            return None;
        }
        let now = self.clock.now();
        let mut state = self.state.lock().expect("cache lock poisoned");

        match state.entries.get(key) {
            None => return None,
            Some(entry) if entry.is_live(now) => return Some(entry.value.clone()),
            Some(_) => {}
        }
        state.entries.remove(key);
        state.order.retain(|k| k != key);
        None
    }

    /// Store `value` under `key` for one TTL.
    ///
    /// Overwriting an existing key keeps its insertion position and never evicts.
    pub fn insert(&self, key: &str, value: V) {
        if !self.is_enabled() {
            return;
        }
        let expires_at = self.clock.now().checked_add_signed(self.ttl);
        let mut state = self.state.lock().expect("cache lock poisoned");

        if let Some(entry) = state.entries.get_mut(key) {
            entry.value = value;
            entry.expires_at = expires_at;
            return;
        }

        while state.entries.len() >= self.capacity {
            match state.order.pop_front() {
                Some(oldest) => {
                    state.entries.remove(&oldest);
                }
                None => break,
            }
        }

        state.order.push_back(key.to_string());
        state
            .entries
            .insert(key.to_string(), CacheEntry { value, expires_at });
    }

    /// Entries currently stored, including ones that expired but were not read yet.
    pub fn len(&self) -> usize {
        self.state.lock().expect("cache lock poisoned").entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn cache(ttl_secs: i64, capacity: usize) -> (TtlCache<String>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let cache = TtlCache::new(Duration::seconds(ttl_secs), capacity, clock.clone());
        (cache, clock)
    }

    #[test]
    fn hit_within_ttl_miss_after() {
        let (cache, clock) = cache(300, 10);
        cache.insert("k", "v".to_string());

        clock.advance(Duration::seconds(300));
        assert_eq!(cache.get("k").as_deref(), Some("v"));

        clock.advance(Duration::seconds(1));
        assert_eq!(cache.get("k"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn zero_ttl_disables_storage() {
        let (cache, _) = cache(0, 10);
        cache.insert("k", "v".to_string());
        assert!(!cache.is_enabled());
        assert_eq!(cache.get("k"), None);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn full_cache_evicts_oldest_insertion() {
        let (cache, _) = cache(300, 2);
        cache.insert("a", "1".to_string());
        cache.insert("b", "2".to_string());
        // Reading does not refresh position.
        assert!(cache.get("a").is_some());
        cache.insert("c", "3".to_string());

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b").as_deref(), Some("2"));
        assert_eq!(cache.get("c").as_deref(), Some("3"));
    }

    #[test]
    fn overwrite_does_not_evict() {
        let (cache, _) = cache(300, 2);
        cache.insert("a", "1".to_string());
        cache.insert("b", "2".to_string());
        cache.insert("a", "updated".to_string());

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a").as_deref(), Some("updated"));
        assert_eq!(cache.get("b").as_deref(), Some("2"));
    }

    #[test]
    fn reinserting_after_expiry_moves_to_back() {
        let (cache, clock) = cache(10, 2);
        cache.insert("a", "1".to_string());
        clock.advance(Duration::seconds(5));
        cache.insert("b", "2".to_string());
        clock.advance(Duration::seconds(6));

        // "a" expired and is dropped on read, then re-inserted as newest.
        assert_eq!(cache.get("a"), None);
        cache.insert("a", "again".to_string());
        cache.insert("c", "3".to_string());

        assert_eq!(cache.get("b"), None);
        assert_eq!(cache.get("a").as_deref(), Some("again"));
        assert_eq!(cache.get("c").as_deref(), Some("3"));
    }

    #[test]
    fn huge_ttl_is_clamped() {
        assert_eq!(ttl_from_secs(u64::MAX), Duration::seconds(MAX_TTL_SECS as i64));
        assert_eq!(ttl_from_secs(i64::MAX as u64), ttl_from_secs(MAX_TTL_SECS));
        assert_eq!(ttl_from_secs(300), Duration::seconds(300));
    }

    #[test]
    fn expiry_past_the_time_range_never_expires() {
        let clock = Arc::new(ManualClock::new(DateTime::<Utc>::MAX_UTC - Duration::days(1)));
        let cache = TtlCache::new(ttl_from_secs(MAX_TTL_SECS), 4, clock.clone());

        cache.insert("k", "v".to_string());
        clock.advance(Duration::hours(23));
        assert_eq!(cache.get("k").as_deref(), Some("v"));
    }
}

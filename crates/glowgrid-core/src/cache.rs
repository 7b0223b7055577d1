//! Time-bounded, fetch-deduplicating data cache.
//!
//! One [`DataCache`] instance exists per data-backed widget kind. Each key
//! maps to a [`CacheEntry`] holding the last payload, when it was fetched and
//! whether a fetch for it is outstanding.
//!
//! # Lifecycle
//!
//! 1. First render of a key: [`DataCache::begin_fetch`] inserts the placeholder
//!    payload with `in_flight = true` and tells the caller to start a fetch.
//! 2. The fetch settles: [`DataCache::resolve`] replaces the entry with the
//!    real or fallback payload and `in_flight = false`.
//! 3. Once `now - fetched_at >= ttl` the entry is stale and the next
//!    `begin_fetch` starts a new cycle on the same key, keeping the stale
//!    payload visible while the fetch runs.
//!
//! Entries are never removed. An in-flight entry suppresses every further
//! fetch for its key until it resolves, stale or not; a fetch that never
//! settles leaves the key in-flight for good.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, TimeDelta, Utc};

/// Weather data time-to-live (10 minutes)
pub const WEATHER_TTL: TimeDelta = TimeDelta::minutes(10);

/// Stock quote time-to-live (5 minutes)
pub const STOCK_TTL: TimeDelta = TimeDelta::minutes(5);

/// A cached payload and its fetch state.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<P> {
    pub payload: P,
    pub fetched_at: DateTime<Utc>,
    pub in_flight: bool,
}

impl<P> CacheEntry<P> {
    /// Whether the entry has outlived `ttl` at `now`.
    pub fn is_stale(&self, now: DateTime<Utc>, ttl: TimeDelta) -> bool {
        now - self.fetched_at >= ttl
    }
}

/// Shared TTL cache handle.
///
/// Cloning is cheap and every clone sees the same map. The lock is only
/// held for the duration of a single call, never across an `.await`.
#[derive(Debug)]
pub struct DataCache<K, P> {
    entries: Arc<Mutex<HashMap<K, CacheEntry<P>>>>,
    ttl: TimeDelta,
}

impl<K, P> Clone for DataCache<K, P> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            ttl: self.ttl,
        }
    }
}

impl<K, P> DataCache<K, P>
where
    K: Eq + Hash + Clone,
    P: Clone,
{
    pub fn new(ttl: TimeDelta) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, CacheEntry<P>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the entry for `key`.
    pub fn get(&self, key: &K) -> Option<CacheEntry<P>> {
        self.lock().get(key).cloned()
    }

    /// Replace the entry for `key` wholesale.
    pub fn put(&self, key: K, entry: CacheEntry<P>) {
        self.lock().insert(key, entry);
    }

    /// Check-and-mark step taken before every paint of a data-backed widget.
    ///
    /// Returns `true` when the caller must start a fetch: the entry was absent
    /// or stale and no fetch was outstanding. The entry is marked in-flight
    /// before returning, so a second caller for the same key gets `false`
    /// until [`resolve`](Self::resolve) runs.
    pub fn begin_fetch(&self, key: &K, now: DateTime<Utc>, placeholder: P) -> bool {
        let mut entries = self.lock();
        match entries.get_mut(key) {
            None => {
                entries.insert(
                    key.clone(),
                    CacheEntry {
                        payload: placeholder,
                        fetched_at: now,
                        in_flight: true,
                    },
                );
                true
            }
            Some(entry) if entry.in_flight => false,
            Some(entry) if entry.is_stale(now, self.ttl) => {
                entry.in_flight = true;
                true
            }
            Some(_) => false,
        }
    }

    /// Record the settled payload of a fetch.
    pub fn resolve(&self, key: K, payload: P, now: DateTime<Utc>) {
        self.put(
            key,
            CacheEntry {
                payload,
                fetched_at: now,
                in_flight: false,
            },
        );
    }

    /// Number of distinct keys ever cached.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_first_request_inserts_placeholder_in_flight() {
        let cache: DataCache<&str, u32> = DataCache::new(STOCK_TTL);

        assert!(cache.begin_fetch(&"k", t0(), 0));

        let entry = cache.get(&"k").unwrap();
        assert_eq!(entry.payload, 0);
        assert!(entry.in_flight);
        assert_eq!(entry.fetched_at, t0());
    }

    #[test]
    fn test_in_flight_suppresses_duplicate_fetch() {
        let cache: DataCache<&str, u32> = DataCache::new(STOCK_TTL);
        assert!(cache.begin_fetch(&"k", t0(), 0));

        assert!(!cache.begin_fetch(&"k", t0(), 0));
        // Even long past the TTL, an outstanding fetch blocks a new one.
        assert!(!cache.begin_fetch(&"k", t0() + TimeDelta::hours(3), 0));
    }

    #[test]
    fn test_fresh_entry_is_not_refetched() {
        let cache: DataCache<&str, u32> = DataCache::new(STOCK_TTL);
        cache.resolve("k", 42, t0());

        let just_before = t0() + STOCK_TTL - TimeDelta::milliseconds(1);
        assert!(!cache.begin_fetch(&"k", just_before, 0));
        assert_eq!(cache.get(&"k").unwrap().payload, 42);
    }

    #[test]
    fn test_entry_at_ttl_triggers_exactly_one_fetch() {
        let cache: DataCache<&str, u32> = DataCache::new(WEATHER_TTL);
        cache.resolve("k", 42, t0());

        let at_ttl = t0() + WEATHER_TTL;
        assert!(cache.begin_fetch(&"k", at_ttl, 0));
        assert!(!cache.begin_fetch(&"k", at_ttl, 0));

        // Stale payload stays visible while the refetch runs.
        let entry = cache.get(&"k").unwrap();
        assert_eq!(entry.payload, 42);
        assert!(entry.in_flight);
    }

    #[test]
    fn test_resolve_clears_in_flight_and_restarts_ttl() {
        let cache: DataCache<&str, u32> = DataCache::new(STOCK_TTL);
        assert!(cache.begin_fetch(&"k", t0(), 0));

        let later = t0() + TimeDelta::seconds(3);
        cache.resolve("k", 7, later);

        let entry = cache.get(&"k").unwrap();
        assert_eq!(entry, CacheEntry { payload: 7, fetched_at: later, in_flight: false });
        assert!(!cache.begin_fetch(&"k", later + TimeDelta::minutes(1), 0));
    }

    #[test]
    fn test_clones_share_entries() {
        let cache: DataCache<String, u32> = DataCache::new(STOCK_TTL);
        let other = cache.clone();

        other.resolve("k".to_owned(), 1, t0());

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&"k".to_owned()).unwrap().payload, 1);
    }
}

//! Bounded route cache keyed by quantized request parameters.
//!
//! Entries expire after a TTL and the least recently used entries are evicted
//! once the capacity is exceeded. Cached routes are validated on read and
//! dropped if they no longer satisfy the route invariants.

use dashmap::DashMap;
use saferoute_core::{Coordinate, Route};
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

const COORD_DECIMALS: i32 = 4;
const WEIGHT_DECIMALS: i32 = 1;

/// Cache key: start/end rounded to 4 decimals, weight to 1 decimal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RouteKey {
    start: (i64, i64),
    end: (i64, i64),
    weight: i64,
}

impl RouteKey {
    pub fn new(start: Coordinate, end: Coordinate, safety_weight: f64) -> Self {
        Self {
            start: quantize_point(start),
            end: quantize_point(end),
            weight: quantize(safety_weight, WEIGHT_DECIMALS),
        }
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let coord = |v: i64| v as f64 / 10f64.powi(COORD_DECIMALS);
        write!(
            f,
            "{:.4},{:.4}_{:.4},{:.4}_{:.1}",
            coord(self.start.0),
            coord(self.start.1),
            coord(self.end.0),
            coord(self.end.1),
            self.weight as f64 / 10f64.powi(WEIGHT_DECIMALS)
        )
    }
}

fn quantize_point(point: Coordinate) -> (i64, i64) {
    (
        quantize(point.lat, COORD_DECIMALS),
        quantize(point.lng, COORD_DECIMALS),
    )
}

fn quantize(value: f64, decimals: i32) -> i64 {
    (value * 10f64.powi(decimals)).round() as i64
}

#[derive(Debug, Clone)]
struct CachedRoute {
    route: Arc<Route>,
    stored_at: Instant,
    last_used: Instant,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expired: u64,
    pub corrupt: u64,
}

enum Lookup {
    Hit(Arc<Route>),
    Miss,
    Expired(Arc<Route>),
    Corrupt(Arc<Route>, String),
}

pub struct RouteCache {
    entries: DashMap<RouteKey, CachedRoute>,
    capacity: usize,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    expired: AtomicU64,
    corrupt: AtomicU64,
}

impl RouteCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            capacity: capacity.max(1),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            expired: AtomicU64::new(0),
            corrupt: AtomicU64::new(0),
        }
    }

    /// Fetch a live entry and mark it as recently used.
    pub fn get(&self, key: &RouteKey) -> Option<Arc<Route>> {
        let now = Instant::now();
        // The shard guard must be released before any removal below.
        let lookup = match self.entries.get_mut(key) {
            None => Lookup::Miss,
            Some(mut entry) => {
                if now.duration_since(entry.stored_at) >= self.ttl {
                    Lookup::Expired(entry.route.clone())
                } else if let Err(defect) = entry.route.validate() {
                    Lookup::Corrupt(entry.route.clone(), defect)
                } else {
                    entry.last_used = now;
                    Lookup::Hit(entry.route.clone())
                }
            }
        };

        match lookup {
            Lookup::Hit(route) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                tracing::debug!("Route cache hit for {}", key);
                Some(route)
            }
            Lookup::Miss => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            Lookup::Expired(stale) => {
                self.discard(key, &stale);
                self.expired.fetch_add(1, Ordering::Relaxed);
                self.misses.fetch_add(1, Ordering::Relaxed);
                tracing::debug!("Route cache entry {} expired", key);
                None
            }
            Lookup::Corrupt(stale, defect) => {
                self.discard(key, &stale);
                self.corrupt.fetch_add(1, Ordering::Relaxed);
                self.misses.fetch_add(1, Ordering::Relaxed);
                tracing::warn!("Discarding corrupt cache entry {}: {}", key, defect);
                None
            }
        }
    }

    /// Store a route, replacing any entry for the same key.
    pub fn set(&self, key: RouteKey, route: Arc<Route>) {
        let now = Instant::now();
        self.entries.insert(
            key,
            CachedRoute {
                route,
                stored_at: now,
                last_used: now,
            },
        );
        if self.entries.len() > self.capacity {
            self.evict_least_recent();
        }
    }

    /// Drop every expired entry.
    pub fn prune_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| now.duration_since(entry.stored_at) < self.ttl);
        let removed = before.saturating_sub(self.entries.len());
        self.expired.fetch_add(removed as u64, Ordering::Relaxed);
        removed
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            capacity: self.capacity,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            expired: self.expired.load(Ordering::Relaxed),
            corrupt: self.corrupt.load(Ordering::Relaxed),
        }
    }

    /// Remove `key` only if it still holds `observed`; a route stored by a
    /// concurrent `set` in the meantime survives.
    fn discard(&self, key: &RouteKey, observed: &Arc<Route>) -> bool {
        self.entries
            .remove_if(key, |_, entry| Arc::ptr_eq(&entry.route, observed))
            .is_some()
    }

    fn evict_least_recent(&self) {
        let mut entries: Vec<(RouteKey, Instant)> = self
            .entries
            .iter()
            .map(|entry| (*entry.key(), entry.value().last_used))
            .collect();
        entries.sort_by_key(|(_, last_used)| *last_used);

        for (key, _) in entries {
            if self.entries.len() <= self.capacity {
                break;
            }
            if self.entries.remove(&key).is_some() {
                self.evictions.fetch_add(1, Ordering::Relaxed);
                tracing::debug!("Evicted route {} from cache", key);
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn insert_raw(&self, key: RouteKey, route: Route) {
        let now = Instant::now();
        self.entries.insert(
            key,
            CachedRoute {
                route: Arc::new(route),
                stored_at: now,
                last_used: now,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use saferoute_core::RouteSource;

    fn route(lat: f64) -> Arc<Route> {
        Arc::new(Route {
            path: vec![Coordinate::new(lat, -74.0), Coordinate::new(lat + 0.01, -73.99)],
            safety_score: 0.8,
            distance_km: 1.2,
            estimated_time_minutes: 14,
            threat_segments: Vec::new(),
            source: RouteSource::Synthesized,
            branch: None,
            last_updated: Utc::now(),
        })
    }

    fn key(lat: f64) -> RouteKey {
        RouteKey::new(Coordinate::new(lat, -74.0), Coordinate::new(lat + 0.01, -73.99), 0.5)
    }

    #[test]
    fn near_duplicate_requests_share_a_key() {
        let end = Coordinate::new(40.75, -73.95);
        let a = RouteKey::new(Coordinate::new(40.70001, -74.00002), end, 0.52);
        let b = RouteKey::new(
            Coordinate::new(40.69998, -73.99999),
            Coordinate::new(40.75003, -73.95),
            0.48,
        );
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "40.7000,-74.0000_40.7500,-73.9500_0.5");

        let c = RouteKey::new(Coordinate::new(40.7002, -74.0), end, 0.5);
        assert_ne!(a, c);
    }

    #[test]
    fn set_then_get_returns_same_snapshot() {
        let cache = RouteCache::new(8, Duration::from_secs(60));
        let stored = route(40.70);
        cache.set(key(40.70), stored.clone());

        let fetched = cache.get(&key(40.70)).unwrap();
        assert!(Arc::ptr_eq(&stored, &fetched));
        assert!(cache.get(&key(40.80)).is_none());

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn set_overwrites_existing_entry() {
        let cache = RouteCache::new(8, Duration::from_secs(60));
        cache.set(key(40.70), route(40.70));
        let replacement = route(40.70);
        cache.set(key(40.70), replacement.clone());
        assert_eq!(cache.len(), 1);
        assert!(Arc::ptr_eq(&cache.get(&key(40.70)).unwrap(), &replacement));
    }

    #[test]
    fn evicts_least_recently_used_beyond_capacity() {
        let cache = RouteCache::new(2, Duration::from_secs(60));
        cache.set(key(40.60), route(40.60));
        std::thread::sleep(Duration::from_millis(2));
        cache.set(key(40.70), route(40.70));
        std::thread::sleep(Duration::from_millis(2));
        // Touch the oldest entry so the middle one becomes least recent.
        assert!(cache.get(&key(40.60)).is_some());
        std::thread::sleep(Duration::from_millis(2));
        cache.set(key(40.80), route(40.80));

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&key(40.60)).is_some());
        assert!(cache.get(&key(40.70)).is_none());
        assert!(cache.get(&key(40.80)).is_some());
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn expired_entries_are_misses() {
        let cache = RouteCache::new(8, Duration::ZERO);
        cache.set(key(40.70), route(40.70));
        assert!(cache.get(&key(40.70)).is_none());
        assert!(cache.is_empty());
        assert_eq!(cache.stats().expired, 1);

        cache.set(key(40.70), route(40.70));
        assert_eq!(cache.prune_expired(), 1);
    }

    #[test]
    fn corrupt_entries_are_discarded() {
        let cache = RouteCache::new(8, Duration::from_secs(60));
        let mut broken = (*route(40.70)).clone();
        broken.path.truncate(1);
        cache.insert_raw(key(40.70), broken);

        assert!(cache.get(&key(40.70)).is_none());
        assert!(cache.is_empty());
        assert_eq!(cache.stats().corrupt, 1);
    }

    #[test]
    fn discarding_a_stale_route_keeps_a_newer_one() {
        let cache = RouteCache::new(8, Duration::from_secs(60));
        let stale = route(40.70);
        cache.set(key(40.70), stale.clone());
        let fresh = route(40.70);
        cache.set(key(40.70), fresh.clone());

        assert!(!cache.discard(&key(40.70), &stale));
        assert!(Arc::ptr_eq(&cache.get(&key(40.70)).unwrap(), &fresh));

        assert!(cache.discard(&key(40.70), &fresh));
        assert!(cache.is_empty());
    }
}

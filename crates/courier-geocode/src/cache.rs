//! Time-boxed in-memory cache for geocoding results.
//!
//! Entries expire lazily on read — there is no background sweeper. The cache
//! is defined as a trait so a distributed deployment can swap in a shared
//! store behind the same contract.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::types::GeocodeResult;

/// Get/set/clear/len contract the geocoding service caches through.
pub trait ResponseCache: Send {
    /// Returns a fresh-enough entry for `key`, removing it first if expired.
    fn get(&mut self, key: &str) -> Option<GeocodeResult>;
    fn set(&mut self, key: String, value: GeocodeResult, ttl: Duration);
    fn clear(&mut self);
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct CacheEntry {
    result: GeocodeResult,
    inserted_at: Instant,
    ttl: Duration,
}

/// In-process TTL map. Suitable for a single-process deployment; memory is
/// bounded only by read traffic naturally evicting stale entries.
#[derive(Default)]
pub struct MemoryCache {
    entries: HashMap<String, CacheEntry>,
}

impl MemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResponseCache for MemoryCache {
    fn get(&mut self, key: &str) -> Option<GeocodeResult> {
        match self.entries.get(key) {
            None => None,
            Some(entry) if entry.inserted_at.elapsed() < entry.ttl => {
                Some(entry.result.clone())
            }
            Some(_) => {
                // Expired: lazy eviction, treated as a miss.
                self.entries.remove(key);
                None
            }
        }
    }

    fn set(&mut self, key: String, value: GeocodeResult, ttl: Duration) {
        self.entries.insert(
            key,
            CacheEntry {
                result: value,
                inserted_at: Instant::now(),
                ttl,
            },
        );
    }

    fn clear(&mut self) {
        self.entries.clear();
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use courier_core::geo::Coordinate;

    use super::*;
    use crate::types::{GeocodeResult, Geometry, LocationType};

    fn sample_result() -> GeocodeResult {
        GeocodeResult {
            formatted_address: "500 Cached Way".to_string(),
            geometry: Geometry {
                location: Coordinate::new(37.0, -122.0),
                location_type: LocationType::Rooftop,
                viewport: None,
            },
            place_id: "cached-place".to_string(),
            types: vec!["street_address".to_string()],
            address_components: vec![],
            partial_match: false,
        }
    }

    #[test]
    fn get_returns_entry_within_ttl() {
        let mut cache = MemoryCache::new();
        cache.set("k".to_string(), sample_result(), Duration::from_secs(60));
        let hit = cache.get("k").expect("entry should be fresh");
        assert_eq!(hit.place_id, "cached-place");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn expired_entry_is_removed_on_read() {
        let mut cache = MemoryCache::new();
        cache.set("k".to_string(), sample_result(), Duration::ZERO);
        assert!(cache.get("k").is_none(), "zero-TTL entry must read as a miss");
        assert_eq!(cache.len(), 0, "expired entry must be evicted, not kept");
    }

    #[test]
    fn clear_drops_all_entries() {
        let mut cache = MemoryCache::new();
        cache.set("a".to_string(), sample_result(), Duration::from_secs(60));
        cache.set("b".to_string(), sample_result(), Duration::from_secs(60));
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get("a").is_none());
    }

    #[test]
    fn set_overwrites_existing_key() {
        let mut cache = MemoryCache::new();
        cache.set("k".to_string(), sample_result(), Duration::from_secs(60));
        let mut updated = sample_result();
        updated.place_id = "updated-place".to_string();
        cache.set("k".to_string(), updated, Duration::from_secs(60));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("k").expect("fresh").place_id, "updated-place");
    }
}

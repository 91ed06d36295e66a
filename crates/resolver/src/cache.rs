use chrono::{DateTime, Utc};
use core_types::{AssetId, PricePoint};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Identifies one memoized resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub asset: AssetId,
    pub instant: DateTime<Utc>,
}

impl CacheKey {
    pub fn new(asset: AssetId, instant: DateTime<Utc>) -> Self {
        Self { asset, instant }
    }
}

/// The outcome of a successful provider call.
/// Failed calls never produce a `Lookup` and are not cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Found(PricePoint),
    NotFound,
}

/// Memoizes resolutions keyed by `(asset, instant)`.
///
/// Implementations decide their own freshness policy; an entry they return
/// is served to the caller without contacting the provider.
pub trait PriceCache: Send + Sync {
    fn get(&self, key: &CacheKey) -> Option<Lookup>;
    fn insert(&self, key: CacheKey, lookup: Lookup);
}

/// A cache whose entries expire a fixed time after insertion.
///
/// Data for past instants never changes upstream, but a lookup for "now" does,
/// so every entry is bounded by the same freshness window.
#[derive(Debug)]
pub struct TtlPriceCache {
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, (Instant, Lookup)>>,
}

impl TtlPriceCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of stored entries, expired ones included until they are touched.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PriceCache for TtlPriceCache {
    fn get(&self, key: &CacheKey) -> Option<Lookup> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        match entries.get(key) {
            Some((stored_at, lookup)) if stored_at.elapsed() < self.ttl => Some(*lookup),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn insert(&self, key: CacheKey, lookup: Lookup) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, (Instant::now(), lookup));
    }
}

/// Disables memoization: every resolution reaches the provider.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCache;

impl PriceCache for NoCache {
    fn get(&self, _key: &CacheKey) -> Option<Lookup> {
        None
    }

    fn insert(&self, _key: CacheKey, _lookup: Lookup) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn key(asset: &str) -> CacheKey {
        CacheKey::new(
            AssetId::new(asset),
            Utc.with_ymd_and_hms(2024, 12, 1, 12, 0, 0).unwrap(),
        )
    }

    fn found() -> Lookup {
        let instant = Utc.with_ymd_and_hms(2024, 12, 1, 12, 0, 0).unwrap();
        Lookup::Found(PricePoint {
            instant,
            sampled_at: instant,
            price: dec!(42),
        })
    }

    #[test]
    fn returns_fresh_entries() {
        let cache = TtlPriceCache::new(Duration::from_secs(3600));
        cache.insert(key("bitcoin"), found());
        cache.insert(key("dogecoin"), Lookup::NotFound);

        assert_eq!(cache.get(&key("bitcoin")), Some(found()));
        assert_eq!(cache.get(&key("dogecoin")), Some(Lookup::NotFound));
        assert_eq!(cache.get(&key("ethereum")), None);
    }

    #[test]
    fn expired_entries_are_misses_and_evicted() {
        let cache = TtlPriceCache::new(Duration::ZERO);
        cache.insert(key("bitcoin"), found());
        assert_eq!(cache.len(), 1);

        assert_eq!(cache.get(&key("bitcoin")), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn key_includes_instant() {
        let cache = TtlPriceCache::new(Duration::from_secs(3600));
        cache.insert(key("bitcoin"), found());

        let later = CacheKey::new(
            AssetId::new("bitcoin"),
            Utc.with_ymd_and_hms(2024, 12, 1, 13, 0, 0).unwrap(),
        );
        assert_eq!(cache.get(&later), None);
    }

    #[test]
    fn no_cache_never_stores() {
        let cache = NoCache;
        cache.insert(key("bitcoin"), found());
        assert_eq!(cache.get(&key("bitcoin")), None);
    }
}

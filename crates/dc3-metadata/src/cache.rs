//! Default in-process [`CacheHandle`] implementation: a fixed-capacity LRU
//! keyed by raster URI, grounded on the chunk cache idiom
//! (`LruCache` + interior mutability behind a mutex) rather than the bare
//! module-level dict the cache started as before this workspace's
//! `CacheHandle` trait boundary was introduced.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use dc3_common::{CacheHandle, CachedRasterRecord};
use lru::LruCache;

/// An in-process LRU [`CacheHandle`], bounded by entry count: records are
/// small fixed-size structs, so a byte-budget like the chunk cache's isn't
/// worth the bookkeeping.
pub struct LruCacheHandle {
    inner: Mutex<LruCache<String, CachedRasterRecord>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl LruCacheHandle {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("capacity clamped to >= 1 above");
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

impl CacheHandle for LruCacheHandle {
    fn put(&self, raster_uri: &str, record: CachedRasterRecord) {
        self.inner
            .lock()
            .expect("cache mutex poisoned")
            .put(raster_uri.to_string(), record);
    }

    fn get(&self, raster_uri: &str) -> Option<CachedRasterRecord> {
        let mut guard = self.inner.lock().expect("cache mutex poisoned");
        let found = guard.get(raster_uri).cloned();
        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dc3_common::ProductType;

    fn toy_record(ts: i64) -> CachedRasterRecord {
        CachedRasterRecord {
            product_timestamp: ts,
            source_crs: "EPSG:32631".into(),
            left: 0.0,
            bottom: 0.0,
            right: 1.0,
            top: 1.0,
            product_type: ProductType::new("sentinel2", "safe"),
        }
    }

    #[test]
    fn test_put_get_roundtrip() {
        let cache = LruCacheHandle::new(8);
        cache.put("a.zip", toy_record(10));
        assert_eq!(cache.get("a.zip").unwrap().product_timestamp, 10);
        assert_eq!(cache.hits(), 1);
    }

    #[test]
    fn test_miss_is_counted() {
        let cache = LruCacheHandle::new(8);
        assert!(cache.get("missing.zip").is_none());
        assert_eq!(cache.misses(), 1);
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let cache = LruCacheHandle::new(1);
        cache.put("a.zip", toy_record(1));
        cache.put("b.zip", toy_record(2));
        assert!(cache.get("a.zip").is_none());
        assert!(cache.get("b.zip").is_some());
    }
}

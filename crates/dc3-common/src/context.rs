//! Build-time configuration and the context struct threaded through every
//! worker instead of relying on process-global state (cache dict, logger
//! singleton) the way the original implementation did.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::model::CachedRasterRecord;

/// Key-value cache for `CachedRasterRecord`s, keyed by raster URI. Written by
/// the Raster Stager (C3), read back by Metadata & Quality (C7) once the
/// source granule file itself has been deleted.
///
/// Implementations must be `Send + Sync`: the orchestrator shares one handle
/// across the worker pool.
pub trait CacheHandle: Send + Sync {
    fn put(&self, raster_uri: &str, record: CachedRasterRecord);
    fn get(&self, raster_uri: &str) -> Option<CachedRasterRecord>;
}

/// Tunables for a build, resolved from defaults, overridden by environment
/// variables, and validated before a build starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Upper bound on concurrently staged/mosaicked granules (Tier 2 workers).
    pub worker_threads: usize,

    /// Root of the cache-record in-process LRU, in entry count (not bytes:
    /// records are small, fixed-size structs).
    pub chunk_cache_entries: usize,

    /// Root directory for per-build scratch trees. Each build gets its own
    /// `{scratch_root}/{cube_id}/` arena, removed unconditionally at the end
    /// of the build.
    pub scratch_root: PathBuf,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            worker_threads: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            chunk_cache_entries: 4096,
            scratch_root: std::env::temp_dir().join("dc3-scratch"),
        }
    }
}

impl BuildConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("DC3_WORKER_THREADS") {
            if let Ok(n) = val.parse() {
                config.worker_threads = n;
            }
        }

        if let Ok(val) = std::env::var("DC3_CHUNK_CACHE_ENTRIES") {
            if let Ok(n) = val.parse() {
                config.chunk_cache_entries = n;
            }
        }

        if let Ok(val) = std::env::var("DC3_SCRATCH_ROOT") {
            config.scratch_root = PathBuf::from(val);
        }

        config
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.worker_threads == 0 {
            return Err("worker_threads must be > 0".to_string());
        }
        if self.chunk_cache_entries == 0 {
            return Err("chunk_cache_entries must be > 0".to_string());
        }
        Ok(())
    }
}

/// Everything a worker needs to stage, mosaic, or write, explicit rather
/// than reached for through global state.
#[derive(Clone)]
pub struct BuildContext {
    pub config: BuildConfig,
    pub cache: Arc<dyn CacheHandle>,
}

impl BuildContext {
    pub fn new(config: BuildConfig, cache: Arc<dyn CacheHandle>) -> Self {
        Self { config, cache }
    }

    /// The per-build scratch arena root; callers create/remove this
    /// directory, `BuildContext` only computes the path.
    pub fn scratch_arena(&self, cube_id: &str) -> PathBuf {
        self.config.scratch_root.join(cube_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::collections::HashMap;

    struct InMemoryCache(Mutex<HashMap<String, CachedRasterRecord>>);

    impl CacheHandle for InMemoryCache {
        fn put(&self, raster_uri: &str, record: CachedRasterRecord) {
            self.0.lock().unwrap().insert(raster_uri.to_string(), record);
        }
        fn get(&self, raster_uri: &str) -> Option<CachedRasterRecord> {
            self.0.lock().unwrap().get(raster_uri).cloned()
        }
    }

    #[test]
    fn test_scratch_arena_path() {
        let mut config = BuildConfig::default();
        config.scratch_root = PathBuf::from("/tmp/dc3-test-scratch");
        let ctx = BuildContext::new(config, Arc::new(InMemoryCache(Mutex::new(HashMap::new()))));
        assert_eq!(
            ctx.scratch_arena("cube-1"),
            PathBuf::from("/tmp/dc3-test-scratch/cube-1")
        );
    }

    #[test]
    fn test_cache_handle_roundtrip() {
        let cache = InMemoryCache(Mutex::new(HashMap::new()));
        let record = CachedRasterRecord {
            product_timestamp: 100,
            source_crs: "EPSG:32631".into(),
            left: 0.0,
            bottom: 0.0,
            right: 1.0,
            top: 1.0,
            product_type: crate::model::ProductType::new("sentinel2", "safe"),
        };
        cache.put("s3://bucket/raster.zip", record.clone());
        let fetched = cache.get("s3://bucket/raster.zip").unwrap();
        assert_eq!(fetched.product_timestamp, record.product_timestamp);
    }

    #[test]
    fn test_validate_rejects_zero_threads() {
        let mut config = BuildConfig::default();
        config.worker_threads = 0;
        assert!(config.validate().is_err());
    }
}

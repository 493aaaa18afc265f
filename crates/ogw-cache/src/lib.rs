//! Two-tier cache with single-flight coalescing. L1 is always present
//! (in-process, bounded); L2 is optional and backend-agnostic via
//! [`l2::DistributedCache`].

pub mod key;
pub mod l1;
pub mod l2;
pub mod single_flight;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use ogw_domain::config::{CacheBackendKind, CacheConfig};
use ogw_domain::Error;

pub use key::derive_cache_key;
pub use l1::L1Cache;
pub use l2::{DistributedCache, InMemoryDistributedCache};
pub use single_flight::SingleFlight;

/// Facade over L1 + optional L2 + single-flight coalescing. Cloneable:
/// internally `Arc`-backed so dispatcher call sites can hold an owned copy.
#[derive(Clone)]
pub struct Cache {
    l1: Arc<L1Cache>,
    l2: Option<Arc<dyn DistributedCache>>,
    single_flight: Arc<SingleFlight<Vec<u8>>>,
    default_ttl: Duration,
}

impl Cache {
    pub fn new(config: &CacheConfig, l2: Option<Arc<dyn DistributedCache>>) -> Self {
        let l2 = match config.backend {
            CacheBackendKind::InProcess => None,
            CacheBackendKind::Distributed => l2,
        };
        Self {
            l1: Arc::new(L1Cache::new(config.max_entries, config.max_bytes)),
            l2,
            single_flight: Arc::new(SingleFlight::new()),
            default_ttl: Duration::from_secs(config.default_ttl_secs),
        }
    }

    /// Construct an L1-only cache, useful for components that don't need
    /// an L2 and don't want to thread a `CacheConfig` through.
    pub fn in_process(max_entries: usize, max_bytes: u64, default_ttl: Duration) -> Self {
        Self {
            l1: Arc::new(L1Cache::new(max_entries, max_bytes)),
            l2: None,
            single_flight: Arc::new(SingleFlight::new()),
            default_ttl,
        }
    }

    async fn read_through(&self, key: &str) -> Option<Vec<u8>> {
        if let Some(bytes) = self.l1.get(key) {
            return Some(bytes);
        }
        let l2 = self.l2.as_ref()?;
        match l2.get(key).await {
            Ok(Some(bytes)) => {
                self.l1.put(key.to_string(), bytes.clone(), self.default_ttl);
                Some(bytes)
            }
            _ => None,
        }
    }

    async fn write_through(&self, key: &str, bytes: Vec<u8>, ttl: Duration) {
        self.l1.put(key.to_string(), bytes.clone(), ttl);
        if let Some(l2) = &self.l2 {
            let _ = l2.set_with_ttl(key, bytes, ttl).await;
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = self.read_through(key).await?;
        serde_json::from_slice(&bytes).ok()
    }

    pub async fn put<T: Serialize>(&self, key: &str, value: &T, ttl: Option<Duration>) {
        let Ok(bytes) = serde_json::to_vec(value) else { return };
        self.write_through(key, bytes, ttl.unwrap_or(self.default_ttl)).await;
    }

    pub async fn invalidate(&self, key: &str) {
        self.l1.invalidate(key);
        if let Some(l2) = &self.l2 {
            let _ = l2.delete(key).await;
        }
    }

    /// Cache-aside with single-flight coalescing: on a miss, only one
    /// concurrent caller for `key` invokes `fetch`; the rest await its
    /// result.
    pub async fn get_or_fetch<T, F, Fut>(&self, key: &str, ttl: Option<Duration>, fetch: F) -> Result<T, Error>
    where
        T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, Error>> + Send + 'static,
    {
        if let Some(value) = self.get::<T>(key).await {
            return Ok(value);
        }

        let ttl = ttl.unwrap_or(self.default_ttl);
        let cache = self.clone();
        let key_owned = key.to_string();

        let result = self
            .single_flight
            .run(key, async move {
                if let Some(cached) = cache.get::<T>(&key_owned).await {
                    return Ok(serde_json::to_vec(&cached).map_err(|e| e.to_string())?);
                }
                let value = fetch().await.map_err(|e| e.to_string())?;
                let bytes = serde_json::to_vec(&value).map_err(|e| e.to_string())?;
                cache.write_through(&key_owned, bytes.clone(), ttl).await;
                Ok(bytes)
            })
            .await
            .map_err(Error::Internal)?;

        serde_json::from_slice(&result).map_err(Error::Json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration as StdDuration;

    fn test_config() -> CacheConfig {
        CacheConfig {
            backend: CacheBackendKind::InProcess,
            max_entries: 100,
            max_bytes: 1_000_000,
            default_ttl_secs: 60,
        }
    }

    #[tokio::test]
    async fn get_or_fetch_populates_cache_on_miss() {
        let cache = Cache::new(&test_config(), None);
        let value: i32 = cache
            .get_or_fetch("k", None, || async { Ok::<i32, Error>(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
        assert_eq!(cache.get::<i32>("k").await, Some(7));
    }

    #[tokio::test]
    async fn get_or_fetch_coalesces_concurrent_misses() {
        let cache = Arc::new(Cache::new(&test_config(), None));
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..10 {
            let cache = cache.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_fetch("same-key", None, move || {
                        let calls = calls.clone();
                        async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(StdDuration::from_millis(20)).await;
                            Ok::<i32, Error>(99)
                        }
                    })
                    .await
            }));
        }

        for h in handles {
            assert_eq!(h.await.unwrap().unwrap(), 99);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1, "Scenario C: 10 concurrent misses, 1 upstream call");
    }

    #[tokio::test]
    async fn invalidate_removes_from_l1() {
        let cache = Cache::new(&test_config(), None);
        cache.put("k", &"v".to_string(), None).await;
        assert_eq!(cache.get::<String>("k").await, Some("v".to_string()));
        cache.invalidate("k").await;
        assert_eq!(cache.get::<String>("k").await, None);
    }

    #[tokio::test]
    async fn distributed_backend_falls_through_to_l2() {
        let l2 = Arc::new(InMemoryDistributedCache::new());
        let cache = Cache::new(
            &CacheConfig { backend: CacheBackendKind::Distributed, ..test_config() },
            Some(l2.clone() as Arc<dyn DistributedCache>),
        );
        cache.put("k", &42i32, None).await;
        // Simulate an L1 eviction: a fresh cache sharing the same L2 should still hit.
        let cache2 = Cache::new(
            &CacheConfig { backend: CacheBackendKind::Distributed, ..test_config() },
            Some(l2 as Arc<dyn DistributedCache>),
        );
        assert_eq!(cache2.get::<i32>("k").await, Some(42));
    }
}

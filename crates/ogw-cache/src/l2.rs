//! L2 distributed cache abstraction. Expressed as a trait so a real backend
//! (Redis, memcache) can be slotted in later without touching the two-tier
//! facade; the in-memory fake is what the test suite and mock server mode
//! use.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;

use ogw_domain::Result;

#[async_trait]
pub trait DistributedCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    async fn set_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<()>;
}

struct Entry {
    value: Vec<u8>,
    expires_at: Instant,
}

/// Fake L2 used in mock mode and in tests; never reaches a network.
#[derive(Default)]
pub struct InMemoryDistributedCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl InMemoryDistributedCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DistributedCache for InMemoryDistributedCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut entries = self.entries.lock();
        let Some(entry) = entries.get(key) else {
            return Ok(None);
        };
        if Instant::now() >= entry.expires_at {
            entries.remove(key);
            return Ok(None);
        }
        Ok(Some(entry.value.clone()))
    }

    async fn set_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        self.entries.lock().insert(
            key.to_string(),
            Entry { value, expires_at: Instant::now() + ttl },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_a_value() {
        let cache = InMemoryDistributedCache::new();
        cache.set_with_ttl("k", vec![1, 2, 3], Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn expired_entry_is_a_miss() {
        let cache = InMemoryDistributedCache::new();
        cache.set_with_ttl("k", vec![1], Duration::from_millis(1)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(cache.get("k").await.unwrap(), None);
    }
}

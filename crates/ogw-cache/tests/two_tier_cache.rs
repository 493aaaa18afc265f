use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ogw_cache::{derive_cache_key, Cache};
use ogw_domain::config::{CacheBackendKind, CacheConfig};
use ogw_domain::Error;
use serde_json::json;

fn cfg() -> CacheConfig {
    CacheConfig { backend: CacheBackendKind::InProcess, max_entries: 50, max_bytes: 1_000_000, default_ttl_secs: 60 }
}

#[tokio::test]
async fn scenario_c_ten_concurrent_identical_calls_one_upstream_call() {
    let cache = Arc::new(Cache::new(&cfg(), None));
    let upstream_calls = Arc::new(AtomicUsize::new(0));
    let key = derive_cache_key("query.execute", &json!({"nrql": "SELECT count(*) FROM Transaction"}), "acct-1", None);

    let mut handles = Vec::new();
    for _ in 0..10 {
        let cache = cache.clone();
        let upstream_calls = upstream_calls.clone();
        let key = key.clone();
        handles.push(tokio::spawn(async move {
            cache
                .get_or_fetch(&key, None, move || {
                    let upstream_calls = upstream_calls.clone();
                    async move {
                        upstream_calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(15)).await;
                        Ok::<serde_json::Value, Error>(json!({"count": 42}))
                    }
                })
                .await
        }));
    }

    for h in handles {
        let v: serde_json::Value = h.await.unwrap().unwrap();
        assert_eq!(v, json!({"count": 42}));
    }
    assert_eq!(upstream_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn cache_key_differs_by_account_scope() {
    let params = json!({"nrql": "SELECT 1"});
    let a = derive_cache_key("query.execute", &params, "acct-1", None);
    let b = derive_cache_key("query.execute", &params, "acct-2", None);
    assert_ne!(a, b);
}

#[tokio::test]
async fn expired_entry_forces_a_fresh_upstream_call() {
    let cache = Cache::new(&cfg(), None);
    let calls = Arc::new(AtomicUsize::new(0));

    let c = calls.clone();
    cache
        .get_or_fetch::<i32, _, _>("k", Some(Duration::from_millis(5)), move || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok(1)
            }
        })
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(20)).await;

    let c = calls.clone();
    cache
        .get_or_fetch::<i32, _, _>("k", Some(Duration::from_millis(5)), move || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok(2)
            }
        })
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn invalidate_forces_next_call_to_refetch() {
    let cache = Cache::new(&cfg(), None);
    cache.put("k", &1i32, None).await;
    cache.invalidate("k").await;
    assert_eq!(cache.get::<i32>("k").await, None);
}

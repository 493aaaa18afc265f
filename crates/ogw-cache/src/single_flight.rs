//! Single-flight request coalescing: concurrent identical requests for an
//! uncached key are coalesced into a single upstream call. An in-flight
//! call is wrapped in a [`futures_util::future::Shared`] keyed by cache
//! key; late arrivals clone the future instead of issuing a new call.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::{BoxFuture, Shared};
use futures_util::FutureExt;
use parking_lot::Mutex;

use ogw_domain::trace::TraceEvent;

type SharedFut<T> = Shared<BoxFuture<'static, Result<T, String>>>;

struct Slot<T: Clone + Send + Sync + 'static> {
    generation: u64,
    future: SharedFut<T>,
}

/// Coalesces concurrent callers asking for the same key into one execution
/// of the supplied future. `T` must be cheaply cloneable (callers typically
/// share an `Arc<Value>` or similarly cheap handle).
pub struct SingleFlight<T: Clone + Send + Sync + 'static> {
    inflight: Mutex<HashMap<String, Slot<T>>>,
    next_generation: Mutex<u64>,
}

impl<T: Clone + Send + Sync + 'static> Default for SingleFlight<T> {
    fn default() -> Self {
        Self { inflight: Mutex::new(HashMap::new()), next_generation: Mutex::new(0) }
    }
}

impl<T: Clone + Send + Sync + 'static> SingleFlight<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `make` to produce the work future only if no call for `key` is
    /// already in flight; otherwise awaits the existing call. The entry is
    /// removed once the leader's call resolves, gated by a generation token
    /// so a fresh call started after removal (a race between "leader
    /// finishes" and "new caller arrives") isn't clobbered by stale cleanup.
    pub async fn run<F>(&self, key: &str, make: F) -> Result<T, String>
    where
        F: Future<Output = Result<T, String>> + Send + 'static,
    {
        let (shared, is_leader, generation) = {
            let mut inflight = self.inflight.lock();
            if let Some(existing) = inflight.get(key) {
                (existing.future.clone(), false, existing.generation)
            } else {
                let mut next = self.next_generation.lock();
                let generation = *next;
                *next = next.wrapping_add(1);
                drop(next);

                let boxed: BoxFuture<'static, Result<T, String>> = Box::pin(make);
                let shared = boxed.shared();
                inflight.insert(key.to_string(), Slot { generation, future: shared.clone() });
                (shared, true, generation)
            }
        };

        if !is_leader {
            TraceEvent::SingleFlightCoalesced { key: key.to_string(), waiters: 1 }.emit();
        }

        let result = shared.await;

        if is_leader {
            let mut inflight = self.inflight.lock();
            if matches!(inflight.get(key), Some(slot) if slot.generation == generation) {
                inflight.remove(key);
            }
        }

        result
    }

    pub fn in_flight_count(&self) -> usize {
        self.inflight.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn concurrent_identical_calls_coalesce_to_one_execution() {
        let sf = Arc::new(SingleFlight::<i32>::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..10 {
            let sf = sf.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                sf.run("k", async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    Ok::<i32, String>(42)
                })
                .await
            }));
        }

        for h in handles {
            assert_eq!(h.await.unwrap(), Ok(42));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1, "only one caller should have executed the work");
    }

    #[tokio::test]
    async fn distinct_keys_do_not_coalesce() {
        let sf = SingleFlight::<i32>::new();
        let a = sf.run("a", async { Ok(1) });
        let b = sf.run("b", async { Ok(2) });
        let (a, b) = tokio::join!(a, b);
        assert_eq!(a, Ok(1));
        assert_eq!(b, Ok(2));
    }

    #[tokio::test]
    async fn a_later_call_after_completion_runs_again() {
        let sf = SingleFlight::<i32>::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let c = calls.clone();
        sf.run("k", async move {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(1)
        })
        .await
        .unwrap();

        let c = calls.clone();
        sf.run("k", async move {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(2)
        })
        .await
        .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(sf.in_flight_count(), 0);
    }
}

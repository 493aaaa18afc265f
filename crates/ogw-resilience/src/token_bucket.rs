//! Token-bucket rate limiter (spec.md §4.2 "Rate Limiter").
//!
//! `tokens <= capacity` always holds (spec.md §3 Token Bucket invariant,
//! §8 invariant 5); refill is computed lazily on each acquisition rather
//! than via a background task, mirroring the teacher's `QuotaTracker`
//! lazy-reset-on-access pattern (`gateway/src/runtime/quota.rs`).

use std::time::{Duration, Instant};

use parking_lot::Mutex;

use ogw_domain::error::{Error, Result};

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

pub struct TokenBucket {
    capacity: f64,
    refill_per_sec: f64,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    pub fn new(capacity: f64, refill_per_sec: f64) -> Self {
        Self {
            capacity,
            refill_per_sec,
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    fn refill_locked(&self, state: &mut BucketState, now: Instant) {
        let elapsed = now.saturating_duration_since(state.last_refill).as_secs_f64();
        if elapsed > 0.0 {
            state.tokens = (state.tokens + elapsed * self.refill_per_sec).min(self.capacity);
            state.last_refill = now;
        }
    }

    /// Non-blocking attempt: consumes one token if available, else returns
    /// `false` without waiting.
    pub fn try_acquire(&self) -> bool {
        let mut state = self.state.lock();
        self.refill_locked(&mut state, Instant::now());
        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// How many seconds until at least one token will be available, given
    /// the current (post-refill) state. `0.0` if a token is available now.
    fn seconds_until_next_token(&self, state: &BucketState) -> f64 {
        if state.tokens >= 1.0 {
            0.0
        } else if self.refill_per_sec <= 0.0 {
            f64::INFINITY
        } else {
            (1.0 - state.tokens) / self.refill_per_sec
        }
    }

    /// Acquire one token, waiting up to `deadline` if none is immediately
    /// available. Fails with `Error::RateLimited` once the deadline would
    /// be exceeded (spec.md §4.2: "on deadline expiry, fails with
    /// rate_limit").
    pub async fn acquire(&self, deadline: Duration) -> Result<()> {
        let wait_for = {
            let mut state = self.state.lock();
            self.refill_locked(&mut state, Instant::now());
            if state.tokens >= 1.0 {
                state.tokens -= 1.0;
                return Ok(());
            }
            self.seconds_until_next_token(&state)
        };

        if wait_for > deadline.as_secs_f64() {
            return Err(Error::RateLimited {
                retry_after_secs: wait_for,
            });
        }

        tokio::time::sleep(Duration::from_secs_f64(wait_for)).await;

        let mut state = self.state.lock();
        self.refill_locked(&mut state, Instant::now());
        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            Ok(())
        } else {
            // Contended by another waiter in the interim.
            let retry_after = self.seconds_until_next_token(&state);
            Err(Error::RateLimited {
                retry_after_secs: retry_after,
            })
        }
    }

    pub fn snapshot(&self) -> TokenBucketSnapshot {
        let mut state = self.state.lock();
        self.refill_locked(&mut state, Instant::now());
        TokenBucketSnapshot {
            capacity: self.capacity,
            tokens: state.tokens,
            refill_per_sec: self.refill_per_sec,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct TokenBucketSnapshot {
    pub capacity: f64,
    pub tokens: f64,
    pub refill_per_sec: f64,
}

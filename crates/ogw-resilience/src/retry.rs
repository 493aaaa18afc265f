//! Retry-with-backoff (spec.md §4.2 "Retry"). Generic over the attempted
//! operation so `ogw-backend` can wrap its GraphQL POST without this crate
//! knowing about HTTP.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use ogw_domain::config::RetryConfig;
use ogw_domain::trace::TraceEvent;

/// Classifies an error as retriable or not. Narrower than
/// `ogw_domain::Error::is_retriable` because retry policy depends on the
/// transport-level cause (network/timeout/5xx vs. GraphQL-semantic or 4xx
/// errors) rather than the taxonomy `ogw_domain::Error` surfaces to
/// callers — the one production implementation lives on
/// `ogw_backend::TransportError`/`TransportErrorOrOpen` (spec.md §4.2
/// non-retriable list), not on `ogw_domain::Error` itself.
pub trait Retriable {
    fn is_retriable(&self) -> bool;
    /// Server-provided retry-after, if any (used for `rate_limit` retries).
    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

/// Runs `op` up to `config.max_retries + 1` times total, backing off
/// exponentially (`base_delay * multiplier^attempt`, +/- jitter) between
/// attempts, bounded by `deadline`. Stops retrying as soon as an attempt's
/// error is non-retriable, or the deadline would be exceeded.
pub async fn retry_with_backoff<T, E, F, Fut>(config: &RetryConfig, deadline: Duration, mut op: F) -> Result<T, E>
where
    E: Retriable,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let start = std::time::Instant::now();
    let mut attempt: u32 = 0;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                let retriable = err.is_retriable();
                if !retriable || attempt >= config.max_retries {
                    return Err(err);
                }

                let remaining = deadline.saturating_sub(start.elapsed());
                if remaining.is_zero() {
                    return Err(err);
                }

                let delay = err
                    .retry_after()
                    .unwrap_or_else(|| backoff_delay(config, attempt));
                let delay = delay.min(remaining);

                TraceEvent::RetryAttempt {
                    attempt: attempt + 1,
                    max_attempts: config.max_retries,
                    delay_ms: delay.as_millis() as u64,
                    reason: "retriable failure".into(),
                }
                .emit();

                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

fn backoff_delay(config: &RetryConfig, attempt: u32) -> Duration {
    let base = config.base_delay_ms as f64 * config.multiplier.powi(attempt as i32);
    let jitter_span = base * config.jitter_ratio;
    let jitter = rand::thread_rng().gen_range(-jitter_span..=jitter_span);
    Duration::from_millis((base + jitter).max(0.0) as u64)
}

//! Circuit breaker (spec.md §4.2, §3 "Circuit Breaker State", §8 invariant
//! 7: state transitions are monotone within `closed -> open -> half_open ->
//! {closed, open}`).

use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::Serialize;

use ogw_domain::error::{Error, Result};
use ogw_domain::trace::TraceEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    fn as_str(self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

struct Inner {
    state: CircuitState,
    consecutive_failures: u32,
    last_transition: Instant,
    /// `half_open` allows exactly one probe call in flight at a time
    /// (spec.md §4.2: "allow a single probe call").
    probe_in_flight: bool,
}

pub struct CircuitBreaker {
    failure_threshold: u32,
    cooldown: Duration,
    inner: Mutex<Inner>,
}

/// What the caller should do, decided atomically with any state mutation
/// the decision implies.
pub enum Admission {
    Allowed,
    AllowedAsProbe,
    Refused,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, cooldown: Duration) -> Self {
        Self {
            failure_threshold: failure_threshold.max(1),
            cooldown,
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                last_transition: Instant::now(),
                probe_in_flight: false,
            }),
        }
    }

    /// Call before attempting the underlying Backend call. Transitions
    /// `open -> half_open` when the cooldown has elapsed.
    pub fn admit(&self) -> Admission {
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::Closed => Admission::Allowed,
            CircuitState::HalfOpen => {
                if inner.probe_in_flight {
                    Admission::Refused
                } else {
                    inner.probe_in_flight = true;
                    Admission::AllowedAsProbe
                }
            }
            CircuitState::Open => {
                if inner.last_transition.elapsed() >= self.cooldown {
                    self.transition_locked(&mut inner, CircuitState::HalfOpen);
                    inner.probe_in_flight = true;
                    Admission::AllowedAsProbe
                } else {
                    Admission::Refused
                }
            }
        }
    }

    /// Guard returned by [`CircuitBreaker::check`] that fails fast with
    /// `Error::CircuitOpen` without touching C1 at all (spec.md §8
    /// invariant 17: "exactly the (N+1)-th consecutive failing call
    /// returns circuit_open without reaching C1").
    pub fn check(&self) -> Result<bool> {
        match self.admit() {
            Admission::Allowed => Ok(false),
            Admission::AllowedAsProbe => Ok(true),
            Admission::Refused => Err(Error::CircuitOpen),
        }
    }

    pub fn record_success(&self) {
        let mut inner = self.inner.lock();
        inner.probe_in_flight = false;
        inner.consecutive_failures = 0;
        if inner.state != CircuitState::Closed {
            self.transition_locked(&mut inner, CircuitState::Closed);
        }
    }

    /// Only transport errors, timeouts, HTTP 5xx and `upstream_error`
    /// classifications count as failures (spec.md §4.2); GraphQL-semantic
    /// errors must not be passed here.
    pub fn record_failure(&self) {
        let mut inner = self.inner.lock();
        inner.probe_in_flight = false;
        match inner.state {
            CircuitState::HalfOpen => {
                self.transition_locked(&mut inner, CircuitState::Open);
                inner.consecutive_failures = self.failure_threshold;
            }
            CircuitState::Closed => {
                inner.consecutive_failures += 1;
                if inner.consecutive_failures >= self.failure_threshold {
                    self.transition_locked(&mut inner, CircuitState::Open);
                }
            }
            CircuitState::Open => {}
        }
    }

    fn transition_locked(&self, inner: &mut Inner, to: CircuitState) {
        let from = inner.state;
        if from == to {
            return;
        }
        TraceEvent::CircuitTransition {
            from: from.as_str(),
            to: to.as_str(),
            consecutive_failures: inner.consecutive_failures,
        }
        .emit();
        inner.state = to;
        inner.last_transition = Instant::now();
    }

    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    pub fn snapshot(&self) -> CircuitSnapshot {
        let inner = self.inner.lock();
        CircuitSnapshot {
            state: inner.state,
            consecutive_failures: inner.consecutive_failures,
            since_transition_secs: inner.last_transition.elapsed().as_secs_f64(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CircuitSnapshot {
    pub state: CircuitState,
    pub consecutive_failures: u32,
    pub since_transition_secs: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_after_threshold_consecutive_failures() {
        let cb = CircuitBreaker::new(5, Duration::from_secs(30));
        for _ in 0..4 {
            assert!(cb.check().is_ok());
            cb.record_failure();
        }
        assert_eq!(cb.state(), CircuitState::Closed);

        assert!(cb.check().is_ok());
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);

        // The (N+1)-th call is refused without reaching C1.
        assert!(matches!(cb.check(), Err(Error::CircuitOpen)));
    }

    #[test]
    fn success_resets_consecutive_failures() {
        let cb = CircuitBreaker::new(3, Duration::from_secs(30));
        cb.record_failure();
        cb.record_failure();
        cb.record_success();
        cb.record_failure();
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn half_open_allows_one_probe_then_reopens_on_failure() {
        let cb = CircuitBreaker::new(1, Duration::from_millis(10));
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);

        std::thread::sleep(Duration::from_millis(15));
        assert!(matches!(cb.admit(), Admission::AllowedAsProbe));
        // A second caller during the same half-open window is refused.
        assert!(matches!(cb.admit(), Admission::Refused));

        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
    }

    #[test]
    fn half_open_probe_success_closes_circuit() {
        let cb = CircuitBreaker::new(1, Duration::from_millis(10));
        cb.record_failure();
        std::thread::sleep(Duration::from_millis(15));
        assert!(matches!(cb.admit(), Admission::AllowedAsProbe));
        cb.record_success();
        assert_eq!(cb.state(), CircuitState::Closed);
    }
}

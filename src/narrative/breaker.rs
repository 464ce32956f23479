use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Consecutive-failure circuit breaker for the narrative generator.
///
/// After `failure_threshold` failures in a row the circuit opens and the
/// generator reports itself unavailable, so reports go straight to fallback
/// text instead of waiting on a dead endpoint. After `cooldown` one request is
/// let through again.
#[derive(Clone)]
pub struct CircuitBreaker {
    failures: Arc<AtomicU64>,
    last_failure: Arc<RwLock<Option<Instant>>>,
    is_open: Arc<AtomicBool>,
    cooldown: Duration,
    failure_threshold: u64,
}

impl CircuitBreaker {
    pub fn new(cooldown: Duration, failure_threshold: u64) -> Self {
        CircuitBreaker {
            failures: Arc::new(AtomicU64::new(0)),
            last_failure: Arc::new(RwLock::new(None)),
            is_open: Arc::new(AtomicBool::new(false)),
            cooldown,
            failure_threshold: failure_threshold.max(1),
        }
    }

    /// Open means: do not call the generator
    pub fn is_open(&self) -> bool {
        if !self.is_open.load(Ordering::Relaxed) {
            return false;
        }

        let last_failure = self.last_failure.read();
        if let Some(time) = *last_failure {
            if time.elapsed() >= self.cooldown {
                // half-open: allow one attempt
                self.is_open.store(false, Ordering::Relaxed);
                self.failures
                    .store(self.failure_threshold.saturating_sub(1), Ordering::Relaxed);
                return false;
            }
        }
        true
    }

    pub fn record_success(&self) {
        self.failures.store(0, Ordering::Relaxed);
        self.is_open.store(false, Ordering::Relaxed);
        *self.last_failure.write() = None;
    }

    pub fn record_failure(&self) {
        let failures = self.failures.fetch_add(1, Ordering::Relaxed) + 1;
        *self.last_failure.write() = Some(Instant::now());

        if failures >= self.failure_threshold && !self.is_open.swap(true, Ordering::Relaxed) {
            tracing::warn!(failures = failures, "Narrative circuit opened");
        }
    }

    pub fn failure_count(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}

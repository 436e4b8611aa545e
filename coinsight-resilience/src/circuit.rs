use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use coinsight_core::{CircuitState, CoinsightError, ProviderConfig};
use tokio::time::Instant;

// opened_at_ms value while the breaker is closed
const CLOSED: u64 = u64::MAX;

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Consecutive-failure circuit breaker with half-open-by-timeout recovery.
///
/// The breaker opens once `failure_threshold` consecutive failures are recorded.
/// After `cooldown` the next [`allow`](Self::allow) closes it lazily without
/// clearing the failure count, so the outcome of that first attempt alone decides:
/// a success zeroes the count, a failure reopens immediately with a new cooldown.
#[derive(Debug)]
pub struct CircuitBreaker {
    provider: &'static str,
    threshold: u32,
    cooldown_ms: u64,
    origin: Instant,
    failures: AtomicU32,
    opened_at_ms: AtomicU64,
    trips: AtomicU64,
}

impl CircuitBreaker {
    /// Create a closed breaker using the threshold and cooldown in `cfg`.
    #[must_use]
    pub fn new(provider: &'static str, cfg: &ProviderConfig) -> Self {
        Self {
            provider,
            threshold: cfg.failure_threshold.max(1),
            cooldown_ms: millis(cfg.cooldown),
            origin: Instant::now(),
            failures: AtomicU32::new(0),
            opened_at_ms: AtomicU64::new(CLOSED),
            trips: AtomicU64::new(0),
        }
    }

    fn now_ms(&self) -> u64 {
        millis(self.origin.elapsed())
    }

    /// Gate a call. Closes an expired open breaker as a side effect.
    ///
    /// # Errors
    /// Returns `CircuitOpen` with the remaining cooldown while open.
    pub fn allow(&self) -> Result<(), CoinsightError> {
        let opened = self.opened_at_ms.load(Ordering::Acquire);
        if opened == CLOSED {
            return Ok(());
        }
        let elapsed = self.now_ms().saturating_sub(opened);
        if elapsed < self.cooldown_ms {
            return Err(CoinsightError::CircuitOpen {
                provider: self.provider.to_string(),
                reset_in_ms: self.cooldown_ms - elapsed,
            });
        }
        if self
            .opened_at_ms
            .compare_exchange(opened, CLOSED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            #[cfg(feature = "tracing")]
            tracing::info!(
                provider = self.provider,
                failures = self.failures.load(Ordering::Acquire),
                "circuit cooldown elapsed; admitting trial attempt"
            );
        }
        Ok(())
    }

    /// Zero the failure count and force the breaker closed.
    pub fn record_success(&self) {
        self.failures.store(0, Ordering::Release);
        let prev = self.opened_at_ms.swap(CLOSED, Ordering::AcqRel);
        if prev != CLOSED {
            #[cfg(feature = "tracing")]
            tracing::info!(provider = self.provider, "circuit closed after success");
        }
    }

    /// Administrative reset: zero the failure count and close the breaker.
    pub fn reset(&self) {
        self.failures.store(0, Ordering::Release);
        if self.opened_at_ms.swap(CLOSED, Ordering::AcqRel) != CLOSED {
            #[cfg(feature = "tracing")]
            tracing::info!(provider = self.provider, "open circuit reset");
        }
    }

    /// Count a failure, opening (or reopening) the breaker at the threshold.
    pub fn record_failure(&self) {
        let n = self.failures.fetch_add(1, Ordering::AcqRel).saturating_add(1);
        if n >= self.threshold {
            let now = self.now_ms();
            let prev = self.opened_at_ms.swap(now, Ordering::AcqRel);
            if prev == CLOSED {
                self.trips.fetch_add(1, Ordering::Relaxed);
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    provider = self.provider,
                    failures = n,
                    cooldown_ms = self.cooldown_ms,
                    "circuit opened"
                );
            }
        }
    }

    /// Current state without side effects. An open breaker whose cooldown has
    /// elapsed reports as closed, since the next call will be admitted.
    #[must_use]
    pub fn state(&self) -> CircuitState {
        let opened = self.opened_at_ms.load(Ordering::Acquire);
        if opened == CLOSED {
            return CircuitState::Closed;
        }
        let open_for_ms = self.now_ms().saturating_sub(opened);
        if open_for_ms >= self.cooldown_ms {
            CircuitState::Closed
        } else {
            CircuitState::Open {
                open_for_ms,
                reset_in_ms: self.cooldown_ms - open_for_ms,
            }
        }
    }

    /// Shorthand for `state().is_open()`.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state().is_open()
    }

    /// Consecutive failures since the last success.
    #[must_use]
    pub fn consecutive_failures(&self) -> u32 {
        self.failures.load(Ordering::Acquire)
    }

    /// Times the breaker has opened since it was created.
    #[must_use]
    pub fn trips(&self) -> u64 {
        self.trips.load(Ordering::Relaxed)
    }
}

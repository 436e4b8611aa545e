//! Sliding-window request limiter with failure-driven exponential backoff.
//!
//! All state is held in atomics so concurrent resolutions against the same
//! provider never take a lock. The window start and the request count share one
//! packed word, which lets a rollover reset both in a single compare-and-swap.
//!
//! Built with `--cfg coinsight_loom`, the atomics come from `loom` so the
//! model in `tests/loom_rate_limiter.rs` can explore every interleaving.

#[cfg(not(coinsight_loom))]
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

#[cfg(coinsight_loom)]
use loom::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use coinsight_core::{CoinsightError, ProviderConfig};
use tokio::time::Instant;

const COUNT_BITS: u32 = 20;
const COUNT_MASK: u64 = (1 << COUNT_BITS) - 1;

const fn pack(start_ms: u64, count: u64) -> u64 {
    (start_ms << COUNT_BITS) | (count & COUNT_MASK)
}

const fn unpack(word: u64) -> (u64, u64) {
    (word >> COUNT_BITS, word & COUNT_MASK)
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Per-provider request limiter.
#[derive(Debug)]
pub struct RateLimiter {
    provider: &'static str,
    window_ms: u64,
    max_requests: u64,
    backoff_base: u32,
    max_backoff_ms: u64,
    origin: Instant,
    // (window start ms << COUNT_BITS) | requests in window
    window_state: AtomicU64,
    failures: AtomicU32,
    last_request_ms: AtomicU64,
    // Retry-After from an upstream 429; 0 when unset
    blocked_until_ms: AtomicU64,
}

impl RateLimiter {
    /// Create a limiter from the window, budget and backoff settings in `cfg`.
    #[must_use]
    pub fn new(provider: &'static str, cfg: &ProviderConfig) -> Self {
        Self {
            provider,
            window_ms: millis(cfg.window).max(1),
            max_requests: u64::from(cfg.max_requests).min(COUNT_MASK),
            backoff_base: cfg.backoff_base.max(1),
            max_backoff_ms: millis(cfg.max_backoff),
            origin: Instant::now(),
            window_state: AtomicU64::new(pack(0, 0)),
            failures: AtomicU32::new(0),
            last_request_ms: AtomicU64::new(0),
            blocked_until_ms: AtomicU64::new(0),
        }
    }

    fn now_ms(&self) -> u64 {
        millis(self.origin.elapsed())
    }

    /// Window start and count as seen at `now`, applying rollover.
    const fn current(&self, word: u64, now: u64) -> (u64, u64) {
        let (start, count) = unpack(word);
        if now.saturating_sub(start) >= self.window_ms {
            (now, 0)
        } else {
            (start, count)
        }
    }

    /// Backoff delay for `failures` consecutive failures: `min(max, base^failures)` seconds.
    #[must_use]
    pub fn backoff_delay(&self, failures: u32) -> Duration {
        if failures == 0 {
            return Duration::ZERO;
        }
        let secs = self
            .backoff_base
            .checked_pow(failures)
            .map_or(u64::MAX, u64::from);
        Duration::from_millis(secs.saturating_mul(1000).min(self.max_backoff_ms))
    }

    fn backoff_remaining_at(&self, now: u64) -> u64 {
        let blocked = self.blocked_until_ms.load(Ordering::Acquire).saturating_sub(now);
        let failures = self.failures.load(Ordering::Acquire);
        if failures == 0 {
            return blocked;
        }
        let delay = millis(self.backoff_delay(failures));
        let since_last = now.saturating_sub(self.last_request_ms.load(Ordering::Acquire));
        delay.saturating_sub(since_last).max(blocked)
    }

    fn throttled(&self, retry_in_ms: u64) -> CoinsightError {
        CoinsightError::Throttled {
            provider: self.provider.to_string(),
            retry_in_ms,
        }
    }

    /// Check both the window and the backoff, consuming one slot on success.
    ///
    /// # Errors
    /// Returns `Throttled` when the backoff has not elapsed or the window is full.
    pub fn try_acquire(&self) -> Result<(), CoinsightError> {
        let now = self.now_ms();
        let wait = self.backoff_remaining_at(now);
        if wait > 0 {
            return Err(self.throttled(wait));
        }

        let mut word = self.window_state.load(Ordering::Acquire);
        loop {
            let (start, count) = self.current(word, now);
            if count >= self.max_requests {
                let retry_in = (start + self.window_ms).saturating_sub(now);
                return Err(self.throttled(retry_in));
            }
            match self.window_state.compare_exchange_weak(
                word,
                pack(start, count + 1),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(actual) => word = actual,
            }
        }
        self.last_request_ms.fetch_max(now, Ordering::AcqRel);
        Ok(())
    }

    /// Read-only check: window capacity and, with failures, elapsed backoff.
    #[must_use]
    pub fn can_make_request(&self) -> bool {
        let now = self.now_ms();
        let (_, count) = self.current(self.window_state.load(Ordering::Acquire), now);
        count < self.max_requests && self.backoff_remaining_at(now) == 0
    }

    /// Clear the consecutive-failure counter and any upstream block.
    pub fn record_success(&self) {
        self.failures.store(0, Ordering::Release);
        self.blocked_until_ms.store(0, Ordering::Release);
    }

    /// Count a failed attempt towards the backoff.
    pub fn record_failure(&self) {
        let now = self.now_ms();
        self.failures.fetch_add(1, Ordering::AcqRel);
        self.last_request_ms.fetch_max(now, Ordering::AcqRel);
    }

    /// Account for an upstream 429.
    ///
    /// Grows the backoff like any failure, treats the current window as spent, and
    /// honours `retry_after` when the provider supplied one.
    pub fn record_rate_limited(&self, retry_after: Option<Duration>) {
        self.record_failure();
        let now = self.now_ms();
        let mut word = self.window_state.load(Ordering::Acquire);
        loop {
            let (start, _) = self.current(word, now);
            match self.window_state.compare_exchange_weak(
                word,
                pack(start, self.max_requests),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(actual) => word = actual,
            }
        }
        if let Some(d) = retry_after {
            self.blocked_until_ms
                .fetch_max(now.saturating_add(millis(d)), Ordering::AcqRel);
        }
        #[cfg(feature = "tracing")]
        tracing::warn!(
            provider = self.provider,
            failures = self.failures(),
            retry_after_ms = retry_after.map(millis),
            "upstream rate limit; window saturated"
        );
    }

    /// Requests counted in the current window.
    #[must_use]
    pub fn requests_in_window(&self) -> u32 {
        let (_, count) = self.current(self.window_state.load(Ordering::Acquire), self.now_ms());
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// Configured window budget.
    #[must_use]
    pub fn max_requests(&self) -> u32 {
        u32::try_from(self.max_requests).unwrap_or(u32::MAX)
    }

    /// Consecutive failures since the last success or reset.
    #[must_use]
    pub fn failures(&self) -> u32 {
        self.failures.load(Ordering::Acquire)
    }

    /// Time left before the backoff admits another request.
    #[must_use]
    pub fn backoff_remaining(&self) -> Duration {
        Duration::from_millis(self.backoff_remaining_at(self.now_ms()))
    }

    /// Start a fresh window and clear all backoff state.
    pub fn reset(&self) {
        let now = self.now_ms();
        self.window_state.store(pack(now, 0), Ordering::Release);
        self.failures.store(0, Ordering::Release);
        self.blocked_until_ms.store(0, Ordering::Release);
    }
}

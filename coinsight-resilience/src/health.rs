use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use coinsight_core::{CircuitStats, CoinsightError, FailureKind, HealthStatus, ProviderConfig};

use crate::{CircuitBreaker, RateLimiter};

/// Shared, lock-free health state for one provider.
#[derive(Debug)]
pub struct ProviderHealth {
    name: &'static str,
    priority: u32,
    limiter: RateLimiter,
    breaker: CircuitBreaker,
}

impl ProviderHealth {
    /// Build limiter and breaker from the provider's configuration.
    #[must_use]
    pub fn new(name: &'static str, cfg: &ProviderConfig) -> Self {
        Self {
            name,
            priority: cfg.priority,
            limiter: RateLimiter::new(name, cfg),
            breaker: CircuitBreaker::new(name, cfg),
        }
    }

    /// Provider name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Static priority; lower is preferred.
    #[must_use]
    pub const fn priority(&self) -> u32 {
        self.priority
    }

    /// The provider's rate limiter.
    #[must_use]
    pub const fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// The provider's circuit breaker.
    #[must_use]
    pub const fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Consecutive failed attempts as seen by either the limiter (429s included)
    /// or the breaker, whichever is larger.
    ///
    /// The periodic counter reset clears only the limiter side, so an outage
    /// streak stays visible here until a success or a circuit reset.
    #[must_use]
    pub fn consecutive_failures(&self) -> u32 {
        self.limiter.failures().max(self.breaker.consecutive_failures())
    }

    /// Ordering tier: 0 healthy, 1 recently failing, 2 circuit open.
    #[must_use]
    pub fn tier(&self) -> u8 {
        if self.breaker.is_open() {
            2
        } else if self.consecutive_failures() > 0 {
            1
        } else {
            0
        }
    }

    /// Gate an attempt: circuit first, then the rate limiter.
    ///
    /// A denied attempt consumes nothing and changes no counters.
    ///
    /// # Errors
    /// Returns `CircuitOpen` or `Throttled`.
    pub fn admit(&self) -> Result<(), CoinsightError> {
        self.breaker.allow()?;
        self.limiter.try_acquire()
    }

    /// Record a successful fetch on both limiter and breaker.
    pub fn record_success(&self) {
        self.limiter.record_success();
        self.breaker.record_success();
    }

    /// Record a failed attempt according to its [`FailureKind`].
    ///
    /// - `Miss`: nothing; the provider answered correctly.
    /// - `RateLimited`: limiter backoff and window saturation only.
    /// - `Unavailable`: limiter backoff and breaker failure count.
    /// - `Skipped`: nothing; no call was made.
    pub fn record_error(&self, err: &CoinsightError) -> FailureKind {
        let kind = err.failure_kind();
        match kind {
            FailureKind::Miss | FailureKind::Skipped => {}
            FailureKind::RateLimited => {
                let retry_after = match err {
                    CoinsightError::RateLimited { retry_after_ms, .. } => {
                        retry_after_ms.map(Duration::from_millis)
                    }
                    _ => None,
                };
                self.limiter.record_rate_limited(retry_after);
            }
            FailureKind::Unavailable => {
                self.limiter.record_failure();
                self.breaker.record_failure();
            }
        }
        kind
    }

    /// Snapshot for observability endpoints.
    #[must_use]
    pub fn status(&self) -> HealthStatus {
        HealthStatus {
            provider: self.name.to_string(),
            priority: self.priority,
            requests_in_window: self.limiter.requests_in_window(),
            max_requests: self.limiter.max_requests(),
            consecutive_failures: self.consecutive_failures(),
            backoff_failures: self.limiter.failures(),
            circuit_failures: self.breaker.consecutive_failures(),
            circuit_state: self.breaker.state(),
            backoff_remaining_ms: u64::try_from(self.limiter.backoff_remaining().as_millis())
                .unwrap_or(u64::MAX),
        }
    }
}

/// Registry of per-provider health, in registration order.
#[derive(Debug, Default)]
pub struct HealthRegistry {
    entries: Vec<Arc<ProviderHealth>>,
    index: HashMap<&'static str, usize>,
}

impl HealthRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider.
    ///
    /// # Errors
    /// Returns `InvalidArg` if `name` is already registered.
    pub fn register(
        &mut self,
        name: &'static str,
        cfg: &ProviderConfig,
    ) -> Result<Arc<ProviderHealth>, CoinsightError> {
        if self.index.contains_key(name) {
            return Err(CoinsightError::InvalidArg(format!(
                "provider '{name}' registered twice"
            )));
        }
        let health = Arc::new(ProviderHealth::new(name, cfg));
        self.index.insert(name, self.entries.len());
        self.entries.push(Arc::clone(&health));
        Ok(health)
    }

    /// Health for `name`, if registered.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<ProviderHealth>> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    /// All providers in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ProviderHealth>> {
        self.entries.iter()
    }

    /// Number of registered providers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Status of every provider in registration order.
    #[must_use]
    pub fn statuses(&self) -> Vec<HealthStatus> {
        self.entries.iter().map(|h| h.status()).collect()
    }

    /// Reset rate-limit windows and backoff for every provider.
    ///
    /// Circuit breakers are left untouched.
    pub fn reset_counters(&self) {
        for h in &self.entries {
            h.limiter.reset();
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(providers = self.entries.len(), "health counters reset");
    }

    /// Close every breaker and zero its failure count.
    ///
    /// Rate-limit windows and backoff are left untouched.
    pub fn reset_circuits(&self) {
        for h in &self.entries {
            h.breaker.reset();
        }
        #[cfg(feature = "tracing")]
        tracing::info!(providers = self.entries.len(), "circuit breakers reset");
    }

    /// Aggregate breaker counters across providers.
    #[must_use]
    pub fn circuit_stats(&self) -> CircuitStats {
        let mut stats = CircuitStats {
            providers: self.entries.len(),
            ..CircuitStats::default()
        };
        for h in &self.entries {
            if h.breaker.is_open() {
                stats.open += 1;
            } else if h.breaker.consecutive_failures() > 0 {
                stats.failing += 1;
            }
            stats.trips += h.breaker.trips();
        }
        stats
    }
}

//! Configuration types shared across the orchestrator, cache and provider clients.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Per-provider connection and resilience settings.
///
/// Every field is supplied externally; the core never hard-codes a limit.
/// `coinsight-providers` ships sensible defaults for the bundled clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Base URL of the upstream API, without a trailing slash.
    pub base_url: String,
    /// Optional API key sent the way the provider expects it.
    pub api_key: Option<String>,
    /// Static rank; lower values are tried first.
    pub priority: u32,
    /// Width of the sliding rate-limit window.
    pub window: Duration,
    /// Maximum requests admitted per window.
    pub max_requests: u32,
    /// Consecutive failures that open the circuit.
    pub failure_threshold: u32,
    /// Time an open circuit waits before admitting the next attempt.
    pub cooldown: Duration,
    /// Base of the exponential backoff (`base^failures` seconds).
    pub backoff_base: u32,
    /// Cap for the exponential backoff delay.
    pub max_backoff: Duration,
    /// Timeout applied to each identity lookup plus fetch.
    pub timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: None,
            priority: 100,
            window: Duration::from_secs(60),
            max_requests: 30,
            failure_threshold: 5,
            cooldown: Duration::from_secs(120),
            backoff_base: 2,
            max_backoff: Duration::from_secs(300),
            timeout: Duration::from_secs(10),
        }
    }
}

impl ProviderConfig {
    /// Start from defaults with the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Set the API key.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the static priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    /// Set the sliding window and its request budget.
    #[must_use]
    pub const fn with_rate_limit(mut self, max_requests: u32, window: Duration) -> Self {
        self.max_requests = max_requests;
        self.window = window;
        self
    }

    /// Set the circuit-breaker threshold and cooldown.
    #[must_use]
    pub const fn with_circuit(mut self, failure_threshold: u32, cooldown: Duration) -> Self {
        self.failure_threshold = failure_threshold;
        self.cooldown = cooldown;
        self
    }

    /// Set the exponential backoff base and cap.
    #[must_use]
    pub const fn with_backoff(mut self, base: u32, max: Duration) -> Self {
        self.backoff_base = base;
        self.max_backoff = max;
        self
    }

    /// Set the per-call timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Settings for the single-flight resolution cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Entries younger than this are served without a provider call.
    pub ttl: Duration,
    /// Entries older than this are removed by the background sweep.
    pub max_age: Duration,
    /// How often the sweep runs.
    pub sweep_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(60),
            max_age: Duration::from_secs(30 * 60),
            sweep_interval: Duration::from_secs(5 * 60),
        }
    }
}

/// The most requested symbols by market cap, a ready-made list for
/// `CoinsightConfig::popular_symbols`.
pub const POPULAR_SYMBOLS: [&str; 16] = [
    "btc", "eth", "usdt", "bnb", "sol", "usdc", "ada", "xrp", "doge", "avax", "trx", "dot",
    "matic", "ltc", "shib", "link",
];

/// Global configuration for the `Coinsight` resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoinsightConfig {
    /// Resolution cache settings.
    pub cache: CacheConfig,
    /// Upper bound on how long a caller waits for one resolution.
    pub request_timeout: Duration,
    /// Cadence of the rate-limit and backoff counter reset.
    pub health_reset_interval: Duration,
    /// Maximum number of memoized provider identities.
    pub identity_cache_capacity: u64,
    /// Serve the last known snapshot before the static fallback set.
    pub serve_stale: bool,
    /// Queries the maintenance task keeps warm; empty disables the refresh.
    pub popular_symbols: Vec<String>,
    /// Cadence of the popular symbol refresh.
    pub refresh_interval: Duration,
}

impl Default for CoinsightConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            request_timeout: Duration::from_secs(30),
            health_reset_interval: Duration::from_secs(60 * 60),
            identity_cache_capacity: 10_000,
            serve_stale: true,
            popular_symbols: Vec::new(),
            refresh_interval: Duration::from_secs(2 * 60),
        }
    }
}

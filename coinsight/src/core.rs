use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use coinsight_core::{
    CircuitStats, CoinsightConfig, CoinsightError, DataSnapshot, Freshness, HealthStatus,
    ProviderClient, ProviderConfig, normalize_query,
};
use coinsight_resilience::HealthRegistry;
use futures::FutureExt;
use futures::future::join_all;
use serde::Serialize;

use crate::cache::{CacheStats, Lookup, ResolutionCache};
use crate::fallback::FallbackStore;
use crate::identity::IdentityCache;
use crate::maintenance::{self, MaintenanceHandle, Schedule};
use crate::orchestrator::{Orchestrator, Registered};

/// A resolved snapshot and how it was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// The snapshot, produced entirely by `snapshot.source`.
    pub snapshot: Arc<DataSnapshot>,
    /// Live, cached, stale, or fallback.
    pub freshness: Freshness,
}

impl Resolved {
    /// True for stale or fallback data.
    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        self.freshness.is_degraded()
    }

    /// Time since the snapshot was captured.
    #[must_use]
    pub fn age(&self) -> chrono::Duration {
        self.snapshot.age(Utc::now())
    }
}

/// Outcome of [`Coinsight::warm`], counted per distinct normalized query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WarmReport {
    /// Already cached and within the TTL; no provider was called.
    pub fresh: usize,
    /// Fetched from a provider and stored.
    pub fetched: usize,
    /// Every provider failed; nothing was stored.
    pub failed: usize,
}

/// Multi-provider resolver with single-flight caching and degraded fallbacks.
///
/// Cheap to clone; clones share cache, provider health and identities.
#[derive(Clone)]
pub struct Coinsight {
    orchestrator: Arc<Orchestrator>,
    cache: Arc<ResolutionCache>,
    fallback: Arc<FallbackStore>,
    cfg: CoinsightConfig,
}

/// Builder for constructing a [`Coinsight`] resolver.
pub struct CoinsightBuilder {
    providers: Vec<(Arc<dyn ProviderClient>, ProviderConfig)>,
    cfg: CoinsightConfig,
    fallback: FallbackStore,
}

impl Default for CoinsightBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CoinsightBuilder {
    /// Create a builder with default settings and the curated fallback set.
    ///
    /// Starts with no providers; register at least one via [`Self::with_provider`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            providers: vec![],
            cfg: CoinsightConfig::default(),
            fallback: FallbackStore::curated(),
        }
    }

    /// Register a provider with its configuration.
    ///
    /// Priority ties are broken by registration order.
    #[must_use]
    pub fn with_provider(mut self, client: Arc<dyn ProviderClient>, cfg: ProviderConfig) -> Self {
        self.providers.push((client, cfg));
        self
    }

    /// Register several providers at once, e.g. `coinsight_providers::standard(..)?`.
    #[must_use]
    pub fn with_providers(
        mut self,
        providers: impl IntoIterator<Item = (Arc<dyn ProviderClient>, ProviderConfig)>,
    ) -> Self {
        self.providers.extend(providers);
        self
    }

    /// Replace the whole global configuration.
    #[must_use]
    pub fn config(mut self, cfg: CoinsightConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// How long a resolved snapshot is served without a provider call.
    #[must_use]
    pub const fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cfg.cache.ttl = ttl;
        self
    }

    /// Age at which the background sweep evicts a snapshot.
    #[must_use]
    pub const fn cache_max_age(mut self, max_age: Duration) -> Self {
        self.cfg.cache.max_age = max_age;
        self
    }

    /// Cadence of the background sweep.
    #[must_use]
    pub const fn sweep_interval(mut self, every: Duration) -> Self {
        self.cfg.cache.sweep_interval = every;
        self
    }

    /// Upper bound on how long a caller waits for one resolution.
    ///
    /// The underlying fetch keeps running and still fills the cache.
    #[must_use]
    pub const fn request_timeout(mut self, timeout: Duration) -> Self {
        self.cfg.request_timeout = timeout;
        self
    }

    /// Cadence of the rate-limit and backoff counter reset.
    #[must_use]
    pub const fn health_reset_interval(mut self, every: Duration) -> Self {
        self.cfg.health_reset_interval = every;
        self
    }

    /// Queries the maintenance task keeps warm, e.g. [`POPULAR_SYMBOLS`].
    ///
    /// [`POPULAR_SYMBOLS`]: coinsight_core::POPULAR_SYMBOLS
    #[must_use]
    pub fn popular_symbols<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cfg.popular_symbols = symbols.into_iter().map(Into::into).collect();
        self
    }

    /// Cadence of the popular symbol refresh.
    #[must_use]
    pub const fn refresh_interval(mut self, every: Duration) -> Self {
        self.cfg.refresh_interval = every;
        self
    }

    /// Serve the last known snapshot before the fallback set when providers are exhausted.
    #[must_use]
    pub const fn serve_stale(mut self, yes: bool) -> Self {
        self.cfg.serve_stale = yes;
        self
    }

    /// Replace the static fallback set.
    #[must_use]
    pub fn fallback_store(mut self, store: FallbackStore) -> Self {
        self.fallback = store;
        self
    }

    /// Build the resolver.
    ///
    /// # Errors
    /// Returns `InvalidArg` when no provider is registered, a provider name is
    /// registered twice, or a window, limit, threshold, backoff base, timeout
    /// or maintenance interval is zero.
    pub fn build(self) -> Result<Coinsight, CoinsightError> {
        if self.providers.is_empty() {
            return Err(CoinsightError::InvalidArg(
                "no providers registered; add at least one via with_provider(...)".to_string(),
            ));
        }
        let cfg = self.cfg;
        for (what, d) in [
            ("request_timeout", cfg.request_timeout),
            ("cache.sweep_interval", cfg.cache.sweep_interval),
            ("health_reset_interval", cfg.health_reset_interval),
            ("refresh_interval", cfg.refresh_interval),
        ] {
            if d.is_zero() {
                return Err(CoinsightError::InvalidArg(format!("{what} must be non-zero")));
            }
        }

        let mut registry = HealthRegistry::new();
        let mut providers = Vec::with_capacity(self.providers.len());
        for (client, pcfg) in self.providers {
            validate_provider(client.name(), &pcfg)?;
            let health = registry.register(client.name(), &pcfg)?;
            providers.push(Registered {
                client,
                health,
                timeout: pcfg.timeout,
            });
        }

        let identities = IdentityCache::new(cfg.identity_cache_capacity);
        Ok(Coinsight {
            orchestrator: Arc::new(Orchestrator::new(providers, registry, identities)),
            cache: Arc::new(ResolutionCache::new(cfg.cache)),
            fallback: Arc::new(self.fallback),
            cfg,
        })
    }
}

fn validate_provider(name: &str, cfg: &ProviderConfig) -> Result<(), CoinsightError> {
    let zero = if cfg.window.is_zero() {
        Some("window")
    } else if cfg.max_requests == 0 {
        Some("max_requests")
    } else if cfg.failure_threshold == 0 {
        Some("failure_threshold")
    } else if cfg.backoff_base == 0 {
        Some("backoff_base")
    } else if cfg.timeout.is_zero() {
        Some("timeout")
    } else {
        None
    };
    match zero {
        Some(field) => Err(CoinsightError::InvalidArg(format!(
            "provider '{name}': {field} must be non-zero"
        ))),
        None => Ok(()),
    }
}

impl Coinsight {
    /// Start building a new resolver.
    ///
    /// ```rust,ignore
    /// let coinsight = coinsight::Coinsight::builder()
    ///     .with_providers(coinsight_providers::standard(None)?)
    ///     .cache_ttl(std::time::Duration::from_secs(60))
    ///     .build()?;
    /// let eth = coinsight.resolve("ETH", false).await?;
    /// ```
    #[must_use]
    pub fn builder() -> CoinsightBuilder {
        CoinsightBuilder::new()
    }

    /// Resolve `query` (symbol or name, any case) to a market snapshot.
    ///
    /// A fresh cache entry is returned as [`Freshness::Cached`]. Otherwise one
    /// shared fetch per query walks the providers; concurrent callers await the
    /// same fetch. `force_refresh` skips the cache but still coalesces.
    ///
    /// When every provider is unavailable, or the caller's wait exceeds the
    /// request timeout, the last known snapshot is served as
    /// [`Freshness::Stale`], then the curated set as [`Freshness::Fallback`].
    ///
    /// # Errors
    /// - `InvalidArg` for a blank query.
    /// - `NotFound` when every attempted provider reported the coin unknown.
    /// - `NoProviderAvailable` / `RequestTimeout` when nothing could be served.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "coinsight::resolve",
            skip(self),
            fields(key = tracing::field::Empty),
        )
    )]
    pub async fn resolve(
        &self,
        query: &str,
        force_refresh: bool,
    ) -> Result<Resolved, CoinsightError> {
        let key = normalize_query(query);
        if key.is_empty() {
            return Err(CoinsightError::InvalidArg("query must not be blank".to_string()));
        }
        #[cfg(feature = "tracing")]
        tracing::Span::current().record("key", key.as_str());

        let lookup = self.lookup(&key, query, force_refresh);
        let err = match tokio::time::timeout(self.cfg.request_timeout, lookup).await {
            Ok(Lookup::Fresh(snapshot)) => {
                return Ok(Resolved {
                    snapshot,
                    freshness: Freshness::Cached,
                });
            }
            Ok(Lookup::Fetched(Ok(snapshot))) => {
                return Ok(Resolved {
                    snapshot,
                    freshness: Freshness::Live,
                });
            }
            Ok(Lookup::Fetched(Err(e))) => e,
            Err(_) => CoinsightError::request_timeout(key.as_str()),
        };
        self.degrade(&key, err)
    }

    async fn lookup(&self, key: &str, query: &str, force_refresh: bool) -> Lookup {
        let orchestrator = Arc::clone(&self.orchestrator);
        let fetch_key = key.to_string();
        let query = query.to_string();
        self.cache
            .get_or_fetch(key, force_refresh, move || {
                async move { orchestrator.resolve(&fetch_key, &query).await }.boxed()
            })
            .await
    }

    /// Resolve every query concurrently, returning results in input order.
    ///
    /// Queries sharing a normalized key share one fetch.
    pub async fn resolve_many<I, S>(
        &self,
        queries: I,
        force_refresh: bool,
    ) -> Vec<Result<Resolved, CoinsightError>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        join_all(
            queries
                .into_iter()
                .map(|q| async move { self.resolve(q.as_ref(), force_refresh).await }),
        )
        .await
    }

    /// Populate the cache for `queries` without returning data.
    ///
    /// Entries still within the TTL are left alone; everything else is fetched
    /// concurrently through the single-flight cache. Failures are counted and
    /// otherwise ignored; no stale or fallback data is involved.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "coinsight::warm", skip_all)
    )]
    pub async fn warm<I, S>(&self, queries: I) -> WarmReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut keys: Vec<String> = queries
            .into_iter()
            .map(|q| normalize_query(q.as_ref()))
            .filter(|k| !k.is_empty())
            .collect();
        keys.sort_unstable();
        keys.dedup();

        let lookups = join_all(keys.iter().map(|k| self.lookup(k, k, false))).await;
        let mut report = WarmReport::default();
        for (key, lookup) in keys.iter().zip(lookups) {
            match lookup {
                Lookup::Fresh(_) => report.fresh += 1,
                Lookup::Fetched(Ok(_)) => report.fetched += 1,
                Lookup::Fetched(Err(e)) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(key = %key, error = %e, "warm-up failed");
                    #[cfg(not(feature = "tracing"))]
                    let _ = (key, e);
                    report.failed += 1;
                }
            }
        }
        report
    }

    fn degrade(&self, key: &str, err: CoinsightError) -> Result<Resolved, CoinsightError> {
        if matches!(
            err,
            CoinsightError::NotFound { .. } | CoinsightError::InvalidArg(_)
        ) {
            return Err(err);
        }
        if self.cfg.serve_stale
            && let Some(snapshot) = self.cache.last_known(key)
        {
            #[cfg(feature = "tracing")]
            tracing::warn!(error = %err, source = %snapshot.source, "serving stale snapshot");
            return Ok(Resolved {
                snapshot,
                freshness: Freshness::Stale,
            });
        }
        if let Some(snapshot) = self.fallback.get(key) {
            #[cfg(feature = "tracing")]
            tracing::warn!(error = %err, "serving fallback snapshot");
            return Ok(Resolved {
                snapshot,
                freshness: Freshness::Fallback,
            });
        }
        Err(err)
    }

    /// Drop the cached snapshot and memoized identities for `query`.
    ///
    /// Returns `true` if a snapshot was cached.
    pub async fn clear_cache(&self, query: &str) -> bool {
        let key = normalize_query(query);
        self.orchestrator
            .identities()
            .invalidate(self.orchestrator.provider_names(), &key)
            .await;
        self.cache.clear(&key)
    }

    /// Drop every cached snapshot and memoized identity.
    pub fn clear_all_caches(&self) {
        self.cache.clear_all();
        self.orchestrator.identities().invalidate_all();
    }

    /// Health of every provider in registration order.
    #[must_use]
    pub fn health_status(&self) -> Vec<HealthStatus> {
        self.orchestrator.registry().statuses()
    }

    /// Reset every provider's rate-limit window and backoff now.
    ///
    /// Circuit breakers keep their state.
    pub fn reset_health_counters(&self) {
        self.orchestrator.registry().reset_counters();
    }

    /// Close every circuit breaker and zero its failure count.
    ///
    /// Rate-limit windows and backoff keep their state.
    pub fn reset_circuits(&self) {
        self.orchestrator.registry().reset_circuits();
    }

    /// Breaker counters aggregated over every provider.
    #[must_use]
    pub fn circuit_stats(&self) -> CircuitStats {
        self.orchestrator.registry().circuit_stats()
    }

    /// Current cache counters.
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Names of the registered providers in the order the next resolution would try them.
    #[must_use]
    pub fn provider_order(&self) -> Vec<&'static str> {
        self.orchestrator
            .ordered()
            .into_iter()
            .map(|p| p.client.name())
            .collect()
    }

    /// Start the background cache sweep, the periodic health counter reset
    /// and, when popular symbols are configured, their refresh.
    ///
    /// The popular symbols are warmed right away and then every refresh
    /// interval. Must be called within a Tokio runtime. Dropping the handle
    /// stops the task.
    #[must_use]
    pub fn spawn_maintenance(&self) -> MaintenanceHandle {
        maintenance::spawn(
            self.clone(),
            Schedule {
                sweep_every: self.cfg.cache.sweep_interval,
                max_age: self.cfg.cache.max_age,
                reset_every: self.cfg.health_reset_interval,
                refresh_every: self.cfg.refresh_interval,
                popular: self.cfg.popular_symbols.clone(),
            },
        )
    }

    pub(crate) fn sweep_cache(&self, max_age: Duration) -> usize {
        self.cache.sweep(max_age)
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &CoinsightConfig {
        &self.cfg
    }
}

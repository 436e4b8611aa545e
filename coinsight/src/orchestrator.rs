use std::sync::Arc;
use std::time::Duration;

use coinsight_core::{CoinsightError, DataSnapshot, FailureKind, ProviderClient};
use coinsight_resilience::{HealthRegistry, ProviderHealth};

use crate::identity::IdentityCache;

/// A provider as registered with the orchestrator.
pub struct Registered {
    pub client: Arc<dyn ProviderClient>,
    pub health: Arc<ProviderHealth>,
    pub timeout: Duration,
}

/// Walks providers in health-adjusted priority order until one produces a snapshot.
pub struct Orchestrator {
    providers: Vec<Registered>,
    registry: HealthRegistry,
    identities: IdentityCache,
}

impl Orchestrator {
    pub fn new(
        providers: Vec<Registered>,
        registry: HealthRegistry,
        identities: IdentityCache,
    ) -> Self {
        Self {
            providers,
            registry,
            identities,
        }
    }

    pub const fn registry(&self) -> &HealthRegistry {
        &self.registry
    }

    pub const fn identities(&self) -> &IdentityCache {
        &self.identities
    }

    pub fn provider_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.providers.iter().map(|p| p.client.name())
    }

    /// Candidates sorted by (tier, priority, registration index).
    pub fn ordered(&self) -> Vec<&Registered> {
        let mut out: Vec<(usize, &Registered)> = self.providers.iter().enumerate().collect();
        out.sort_by_key(|(orig_i, p)| (p.health.tier(), p.health.priority(), *orig_i));
        out.into_iter().map(|(_, p)| p).collect()
    }

    /// Wrap a provider future with a timeout and standardized timeout error mapping.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "coinsight::orchestrator::provider_call_with_timeout",
            level = "debug",
            skip(fut),
            fields(timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)),
        )
    )]
    async fn provider_call_with_timeout<T, Fut>(
        provider: &'static str,
        timeout: Duration,
        fut: Fut,
    ) -> Result<T, CoinsightError>
    where
        Fut: std::future::Future<Output = Result<T, CoinsightError>>,
    {
        (tokio::time::timeout(timeout, fut).await)
            .unwrap_or_else(|_| Err(CoinsightError::provider_timeout(provider)))
    }

    async fn attempt(
        &self,
        p: &Registered,
        key: &str,
        query: &str,
    ) -> Result<DataSnapshot, CoinsightError> {
        let name = p.client.name();
        let identity = self.identities.resolve(&p.client, key, query).await?;
        let snapshot = p.client.fetch_data(&identity).await?;
        if snapshot.source != name {
            return Err(CoinsightError::unavailable(
                name,
                format!("snapshot tagged with foreign source '{}'", snapshot.source),
            ));
        }
        Ok(snapshot)
    }

    /// Resolve the normalized query `key` against the first provider that succeeds.
    ///
    /// Providers that have not memoized an identity for `key` are asked with
    /// the caller's raw `query`.
    ///
    /// Every attempt is recorded on that provider's health before moving on.
    /// Skipped providers (open circuit, exhausted window, backoff) are not called.
    ///
    /// # Errors
    /// - `NotFound` when every candidate was attempted and none knows `key`.
    /// - `NoProviderAvailable` otherwise, carrying each candidate's outcome.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "coinsight::orchestrator::resolve",
            skip(self, query),
            fields(providers = self.providers.len()),
        )
    )]
    pub async fn resolve(
        &self,
        key: &str,
        query: &str,
    ) -> Result<Arc<DataSnapshot>, CoinsightError> {
        let mut attempted_any = false;
        let mut all_missed = true;
        let mut errors: Vec<CoinsightError> = Vec::new();

        for p in self.ordered() {
            let name = p.client.name();
            if let Err(e) = p.health.admit() {
                #[cfg(feature = "tracing")]
                tracing::debug!(provider = name, error = %e, "skipped");
                all_missed = false;
                errors.push(e);
                continue;
            }
            attempted_any = true;
            let call = self.attempt(p, key, query);
            match Self::provider_call_with_timeout(name, p.timeout, call).await {
                Ok(snapshot) => {
                    p.health.record_success();
                    #[cfg(feature = "tracing")]
                    tracing::info!(provider = name, "resolved");
                    return Ok(Arc::new(snapshot));
                }
                Err(e) => {
                    let kind = p.health.record_error(&e);
                    #[cfg(feature = "tracing")]
                    tracing::warn!(provider = name, error = %e, ?kind, "attempt failed");
                    if kind != FailureKind::Miss {
                        all_missed = false;
                    }
                    errors.push(e);
                }
            }
        }

        if attempted_any && all_missed {
            return Err(CoinsightError::not_found(format!("coin '{key}'")));
        }
        Err(CoinsightError::NoProviderAvailable {
            query: key.to_string(),
            attempts: errors,
        })
    }
}

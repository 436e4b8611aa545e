use std::sync::Arc;

use coinsight_core::{CoinsightError, CryptoIdentity, ProviderClient};
use moka::future::Cache;

/// Memoized provider identities keyed by (provider, normalized query).
///
/// Entries never expire; capacity bounds memory. Misses are not stored, so an
/// `IdentityNotFound` is retried on the next resolution.
pub struct IdentityCache {
    inner: Cache<(&'static str, String), CryptoIdentity>,
}

impl IdentityCache {
    pub fn new(capacity: u64) -> Self {
        Self {
            inner: Cache::new(capacity),
        }
    }

    /// Identity for `key` from `client`, coalescing concurrent lookups.
    ///
    /// On a miss the provider is asked with the caller's raw `query`; the
    /// memo entry is keyed by `key` only.
    pub async fn resolve(
        &self,
        client: &Arc<dyn ProviderClient>,
        key: &str,
        query: &str,
    ) -> Result<CryptoIdentity, CoinsightError> {
        let client = Arc::clone(client);
        let query = query.to_string();
        self.inner
            .try_get_with((client.name(), key.to_string()), async move {
                client.resolve_identity(&query).await
            })
            .await
            .map_err(|e| (*e).clone())
    }

    /// Forget `key` for every provider in `providers`.
    pub async fn invalidate(&self, providers: impl IntoIterator<Item = &'static str>, key: &str) {
        for name in providers {
            self.inner.invalidate(&(name, key.to_string())).await;
        }
    }

    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }
}

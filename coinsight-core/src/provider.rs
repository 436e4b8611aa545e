use async_trait::async_trait;

use crate::{CoinsightError, CryptoIdentity, DataSnapshot};

/// A single upstream market-data source.
///
/// Implementations are stateless apart from their HTTP client: rate limiting,
/// backoff and circuit breaking are applied by the orchestrator around every
/// call, so a client only has to map the provider's schema onto
/// [`CryptoIdentity`] and [`DataSnapshot`].
///
/// Error contract:
/// - `resolve_identity` returns `IdentityNotFound` when the provider's directory
///   has no symbol or name match for the query.
/// - Both methods return `RateLimited` for HTTP 429 and `ProviderUnavailable` for
///   any other transport, status, or decode failure.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Stable, unique provider name. Used as the health, identity and `source` key.
    fn name(&self) -> &'static str;

    /// Human-friendly vendor string.
    fn vendor(&self) -> &'static str {
        "unknown"
    }

    /// Map a free-text query onto this provider's coin identity.
    ///
    /// Matching is two-tier: an exact case-insensitive symbol match wins over a
    /// case-insensitive name match.
    async fn resolve_identity(&self, query: &str) -> Result<CryptoIdentity, CoinsightError>;

    /// Fetch a fresh snapshot for an identity this provider resolved.
    ///
    /// Returns `ProviderUnavailable` without touching the network when the
    /// identity carries no id for this provider.
    async fn fetch_data(&self, identity: &CryptoIdentity) -> Result<DataSnapshot, CoinsightError>;
}

/// Look up `provider`'s id on `identity`, failing as unavailable when missing.
///
/// # Errors
/// Returns `ProviderUnavailable` when the identity was not resolved by `provider`.
pub fn require_provider_id<'a>(
    provider: &str,
    identity: &'a CryptoIdentity,
) -> Result<&'a str, CoinsightError> {
    identity.provider_id(provider).ok_or_else(|| {
        CoinsightError::unavailable(
            provider,
            format!("identity for '{}' has no {provider} id", identity.query()),
        )
    })
}

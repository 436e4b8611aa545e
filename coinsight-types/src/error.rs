use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for the coinsight workspace.
///
/// Per-provider variants (`IdentityNotFound`, `ProviderUnavailable`, `RateLimited`,
/// `CircuitOpen`, `Throttled`, `ProviderTimeout`) are recovered locally by the
/// orchestrator; only `NotFound`, `NoProviderAvailable` and `RequestTimeout`
/// normally reach callers of `resolve`.
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CoinsightError {
    /// The provider's coin directory has no match for the query.
    #[error("{provider}: no identity for '{query}'")]
    IdentityNotFound {
        /// Provider that performed the lookup.
        provider: String,
        /// Query as given by the caller.
        query: String,
    },

    /// Network, HTTP status, or decode failure at a provider.
    #[error("{provider} unavailable: {msg}")]
    ProviderUnavailable {
        /// Provider that failed.
        provider: String,
        /// Human-readable error message.
        msg: String,
    },

    /// The provider answered with HTTP 429.
    #[error("{provider} rate limited upstream (retry_after_ms={retry_after_ms:?})")]
    RateLimited {
        /// Provider that rejected the request.
        provider: String,
        /// Value of the `Retry-After` header, when supplied.
        retry_after_ms: Option<u64>,
    },

    /// The provider was skipped because its circuit is open.
    #[error("{provider} circuit open: reset_in_ms={reset_in_ms}")]
    CircuitOpen {
        /// Provider whose breaker is open.
        provider: String,
        /// Milliseconds until the cooldown elapses.
        reset_in_ms: u64,
    },

    /// The provider was skipped by the local rate limiter.
    #[error("{provider} throttled locally: retry_in_ms={retry_in_ms}")]
    Throttled {
        /// Provider whose window or backoff denied the call.
        provider: String,
        /// Best-effort hint of when a call may be admitted again.
        retry_in_ms: u64,
    },

    /// A single provider attempt exceeded its per-call timeout.
    #[error("{provider} timed out")]
    ProviderTimeout {
        /// Provider that timed out.
        provider: String,
    },

    /// Every candidate provider was skipped or failed.
    #[error("no provider available for '{query}': {attempts:?}")]
    NoProviderAvailable {
        /// Normalized query that could not be resolved.
        query: String,
        /// Per-provider outcomes in attempt order.
        attempts: Vec<CoinsightError>,
    },

    /// Every attempted provider reported that the query does not exist.
    #[error("not found: {what}")]
    NotFound {
        /// Description of the missing resource.
        what: String,
    },

    /// The overall resolution deadline elapsed.
    #[error("request timed out: {query}")]
    RequestTimeout {
        /// Normalized query that timed out.
        query: String,
    },

    /// Invalid input argument or configuration.
    #[error("invalid argument: {0}")]
    InvalidArg(String),

    /// Issues with the returned or expected data (missing fields, etc.).
    #[error("data issue: {0}")]
    Data(String),
}

/// How a per-provider error is accounted against that provider's health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The provider does not know the query. Not a fetch failure.
    Miss,
    /// Upstream 429. Tightens the rate limiter without tripping the breaker.
    RateLimited,
    /// Network, status, decode, or timeout failure. Counts everywhere.
    Unavailable,
    /// The provider was never called.
    Skipped,
}

impl CoinsightError {
    /// Helper: build an `IdentityNotFound` error.
    pub fn identity_not_found(provider: impl Into<String>, query: impl Into<String>) -> Self {
        Self::IdentityNotFound {
            provider: provider.into(),
            query: query.into(),
        }
    }

    /// Helper: build a `ProviderUnavailable` error with the provider name and message.
    pub fn unavailable(provider: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::ProviderUnavailable {
            provider: provider.into(),
            msg: msg.into(),
        }
    }

    /// Helper: build a `RateLimited` error.
    pub fn rate_limited(provider: impl Into<String>, retry_after_ms: Option<u64>) -> Self {
        Self::RateLimited {
            provider: provider.into(),
            retry_after_ms,
        }
    }

    /// Helper: build a `NotFound` error for a description of the missing resource.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Helper: build a `ProviderTimeout` error.
    pub fn provider_timeout(provider: impl Into<String>) -> Self {
        Self::ProviderTimeout {
            provider: provider.into(),
        }
    }

    /// Helper: build a `RequestTimeout` error.
    #[must_use]
    pub fn request_timeout(query: impl Into<String>) -> Self {
        Self::RequestTimeout {
            query: query.into(),
        }
    }

    /// Name of the provider this error is attributed to, if any.
    #[must_use]
    pub fn provider(&self) -> Option<&str> {
        match self {
            Self::IdentityNotFound { provider, .. }
            | Self::ProviderUnavailable { provider, .. }
            | Self::RateLimited { provider, .. }
            | Self::CircuitOpen { provider, .. }
            | Self::Throttled { provider, .. }
            | Self::ProviderTimeout { provider } => Some(provider),
            _ => None,
        }
    }

    /// Classify this error for health accounting.
    ///
    /// Errors that are not per-provider (aggregates, argument errors) are
    /// treated as `Unavailable` so a misbehaving client cannot dodge the breaker
    /// by returning them.
    #[must_use]
    pub const fn failure_kind(&self) -> FailureKind {
        match self {
            Self::IdentityNotFound { .. } | Self::NotFound { .. } => FailureKind::Miss,
            Self::RateLimited { .. } => FailureKind::RateLimited,
            Self::CircuitOpen { .. } | Self::Throttled { .. } => FailureKind::Skipped,
            _ => FailureKind::Unavailable,
        }
    }

    /// Returns true if this error should be surfaced to users as actionable.
    ///
    /// Misses and local skips are benign. Aggregates are classified based on
    /// their contents.
    #[must_use]
    pub fn is_actionable(&self) -> bool {
        match self {
            Self::IdentityNotFound { .. }
            | Self::NotFound { .. }
            | Self::CircuitOpen { .. }
            | Self::Throttled { .. } => false,
            Self::NoProviderAvailable { attempts, .. } => attempts.iter().any(Self::is_actionable),
            _ => true,
        }
    }

    /// Flatten nested `NoProviderAvailable` structures into a plain vector.
    #[must_use]
    pub fn flatten(self) -> Vec<Self> {
        match self {
            Self::NoProviderAvailable { attempts, .. } => {
                attempts.into_iter().flat_map(Self::flatten).collect()
            }
            other => vec![other],
        }
    }
}

//! coinsight-core
//!
//! Core traits and helpers shared across the coinsight ecosystem.
//!
//! - `provider`: the `ProviderClient` trait every upstream source implements.
//! - `directory`: query normalization and two-tier symbol/name matching.
#![warn(missing_docs)]

/// Query normalization and coin directory matching.
pub mod directory;
/// The `ProviderClient` trait.
pub mod provider;

pub use coinsight_types::{
    CacheConfig, CircuitState, CircuitStats, CoinsightConfig, CoinsightError, CryptoIdentity,
    DataSnapshot, Decimal, FALLBACK_SOURCE, FailureKind, Freshness, HealthStatus, POPULAR_SYMBOLS,
    ProviderConfig,
};
pub use directory::{DirectoryEntry, match_directory, normalize_query, resolve_from_directory};
pub use provider::{ProviderClient, require_provider_id};

//! Coinsight resolves crypto market data across several upstream providers.
//!
//! Overview
//! - Providers implement [`coinsight_core::ProviderClient`]; the bundled HTTP
//!   clients live in `coinsight-providers`, test doubles in `coinsight-mock`.
//! - Each resolution walks providers ordered by (health tier, priority,
//!   registration order). Open circuits and exhausted rate windows are skipped
//!   without a call; the first provider that resolves the identity and fetches
//!   a snapshot wins. Fields are never merged across providers.
//! - A single-flight TTL cache sits in front of the walk: concurrent requests
//!   for one query share a single fetch, which runs as its own task and
//!   survives cancellation of its callers.
//! - When every provider is unavailable, the last known snapshot is served as
//!   stale and then a curated static snapshot as fallback; both are tagged on
//!   the returned [`Resolved`].
//!
//! Key behaviors and trade-offs
//! - Health: per provider, a sliding-window limiter with exponential backoff
//!   and a circuit breaker that opens after consecutive outages and lets one
//!   attempt through once its cooldown elapses. Upstream 429s tighten the
//!   limiter but never trip the breaker. A "not listed" answer changes no
//!   counters.
//! - Maintenance: [`Coinsight::spawn_maintenance`] sweeps old cache entries,
//!   resets rate-limit counters on a fixed cadence and keeps the configured
//!   popular symbols warm. Circuits are only reset on request through
//!   [`Coinsight::reset_circuits`].
//! - Batches: [`Coinsight::resolve_many`] fans out through the same cache;
//!   [`Coinsight::warm`] fills it without returning data.
//!
//! Examples
//! ```rust,ignore
//! use coinsight::Coinsight;
//!
//! let coinsight = Coinsight::builder()
//!     .with_providers(coinsight_providers::standard(std::env::var("CMC_API_KEY").ok())?)
//!     .build()?;
//! let _maintenance = coinsight.spawn_maintenance();
//! coinsight.warm(coinsight::POPULAR_SYMBOLS).await;
//!
//! let btc = coinsight.resolve("bitcoin", false).await?;
//! println!("{} {:?} via {} ({:?})",
//!     btc.snapshot.symbol, btc.snapshot.current_price, btc.snapshot.source, btc.freshness);
//!
//! for h in coinsight.health_status() {
//!     println!("{}: {} failures, {}", h.provider, h.consecutive_failures, h.circuit_state);
//! }
//! ```
#![warn(missing_docs)]

mod cache;
mod core;
mod fallback;
mod identity;
mod maintenance;
mod orchestrator;

pub use crate::cache::CacheStats;
pub use crate::core::{Coinsight, CoinsightBuilder, Resolved, WarmReport};
pub use crate::fallback::FallbackStore;
pub use crate::maintenance::MaintenanceHandle;

pub use coinsight_core::{
    CacheConfig, CircuitState, CircuitStats, CoinsightConfig, CoinsightError, CryptoIdentity,
    DataSnapshot, Decimal, FALLBACK_SOURCE, Freshness, HealthStatus, POPULAR_SYMBOLS,
    ProviderClient, ProviderConfig,
};

//! coinsight-resilience
//!
//! Per-provider health primitives used by the orchestrator:
//! a sliding-window [`RateLimiter`] with exponential backoff, a
//! [`CircuitBreaker`] with timed recovery, and the [`HealthRegistry`] that owns
//! one [`ProviderHealth`] per registered provider.
//!
//! Time is measured with `tokio::time::Instant`, so a paused Tokio test clock
//! drives windows, backoff and cooldowns deterministically.

mod circuit;
mod health;
mod rate_limit;

pub use crate::circuit::CircuitBreaker;
pub use crate::health::{HealthRegistry, ProviderHealth};
pub use crate::rate_limit::RateLimiter;

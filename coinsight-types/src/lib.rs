//! Coinsight data transfer objects, error taxonomy and configuration primitives.
#![warn(missing_docs)]

mod config;
mod error;
mod health;
mod identity;
mod snapshot;

pub use config::{CacheConfig, CoinsightConfig, POPULAR_SYMBOLS, ProviderConfig};
pub use error::{CoinsightError, FailureKind};
pub use health::{CircuitState, CircuitStats, HealthStatus};
pub use identity::CryptoIdentity;
pub use rust_decimal::Decimal;
pub use snapshot::{DataSnapshot, FALLBACK_SOURCE, Freshness};

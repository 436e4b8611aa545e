//! Deterministic provider doubles for tests and demos.
//!
//! - [`MockProvider`]: static fixture directory with a few magic symbols that
//!   force failure modes (`FAIL`, `TIMEOUT`, `RATELIMIT`).
//! - [`DynamicMockProvider`]: behaviour scripted at runtime through a
//!   [`DynamicMockController`], with call counters for single-flight assertions.

use std::time::Duration;

use async_trait::async_trait;
use coinsight_core::{
    CoinsightError, CryptoIdentity, DataSnapshot, ProviderClient, require_provider_id,
    resolve_from_directory,
};

mod dynamic;
mod fixtures;

pub use dynamic::{DynamicMockController, DynamicMockProvider, MockBehavior};

/// Mock provider for CI-safe demos. Serves deterministic data from static fixtures.
pub struct MockProvider {
    name: &'static str,
    timeout_delay: Duration,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    /// Mock registered under the name `"mock"`.
    #[must_use]
    pub const fn new() -> Self {
        Self::named("mock")
    }

    /// Mock registered under a custom name, so several can coexist.
    #[must_use]
    pub const fn named(name: &'static str) -> Self {
        Self {
            name,
            timeout_delay: Duration::from_secs(60),
        }
    }

    /// How long the `TIMEOUT` coin stalls before answering.
    #[must_use]
    pub const fn with_timeout_delay(mut self, delay: Duration) -> Self {
        self.timeout_delay = delay;
        self
    }

    async fn maybe_fail_or_stall(&self, symbol: &str) -> Result<(), CoinsightError> {
        match symbol {
            "FAIL" => Err(CoinsightError::unavailable(
                self.name,
                "forced failure: fetch_data",
            )),
            "RATELIMIT" => Err(CoinsightError::rate_limited(self.name, Some(1_000))),
            "TIMEOUT" => {
                tokio::time::sleep(self.timeout_delay).await;
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl ProviderClient for MockProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    fn vendor(&self) -> &'static str {
        "Mock"
    }

    async fn resolve_identity(&self, query: &str) -> Result<CryptoIdentity, CoinsightError> {
        resolve_from_directory(self.name, query, &fixtures::directory())
    }

    async fn fetch_data(&self, identity: &CryptoIdentity) -> Result<DataSnapshot, CoinsightError> {
        let id = require_provider_id(self.name, identity)?;
        self.maybe_fail_or_stall(identity.symbol()).await?;
        fixtures::snapshot(self.name, id)
            .ok_or_else(|| CoinsightError::unavailable(self.name, format!("unknown coin id {id}")))
    }
}

#![allow(dead_code)]

use std::sync::Arc;

use coinsight::{ProviderClient, ProviderConfig};

/// Providers for the demos: the four live APIs, or two mocks in CI when
/// `COINSIGHT_EXAMPLES_USE_MOCK` is set.
///
/// # Panics
/// Panics if a bundled base URL fails to parse, which would be a bug.
#[must_use]
pub fn providers() -> Vec<(Arc<dyn ProviderClient>, ProviderConfig)> {
    if std::env::var("COINSIGHT_EXAMPLES_USE_MOCK").is_ok() {
        println!("--- (Using Mock Providers for CI) ---");
        let primary: Arc<dyn ProviderClient> =
            Arc::new(coinsight_mock::MockProvider::named("mock-a"));
        let backup: Arc<dyn ProviderClient> =
            Arc::new(coinsight_mock::MockProvider::named("mock-b"));
        vec![
            (primary, ProviderConfig::new("mock://").with_priority(1)),
            (backup, ProviderConfig::new("mock://").with_priority(2)),
        ]
    } else {
        let cmc_key = std::env::var("COINMARKETCAP_API_KEY").ok();
        coinsight_providers::standard(cmc_key).expect("bundled provider configs are valid")
    }
}

/// Install a `fmt` subscriber filtered by `RUST_LOG` (default `coinsight=info`).
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("coinsight=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

//! coinsight-providers
//!
//! HTTP clients for the four market-data vendors coinsight resolves against.
//! Each client implements [`coinsight_core::ProviderClient`] and ships a
//! `default_config()` carrying the vendor's public endpoint, default priority
//! and free-tier request budget.
//!
//! | Provider        | Priority | Budget     | Identity lookup                         |
//! |-----------------|----------|------------|-----------------------------------------|
//! | [`CoinGecko`]     | 1        | 30 / min   | `/search?query=`                        |
//! | [`CoinMarketCap`] | 2        | 10 / min   | `/v1/cryptocurrency/map` (symbol, then listing) |
//! | [`CoinPaprika`]   | 3        | 25 / min   | `/search?q=`, then `/coins`             |
//! | [`CryptoCompare`] | 4        | 100 / min  | `/data/all/coinlist`                    |
//!
//! Error mapping is shared: HTTP 429 becomes `RateLimited` (with `Retry-After`
//! in milliseconds when present), client timeouts become `ProviderTimeout`, and
//! every other transport, status or decode failure becomes `ProviderUnavailable`.
//! A query absent from the vendor's directory is `IdentityNotFound`.
#![warn(missing_docs)]

use std::sync::Arc;

use coinsight_core::{CoinsightError, ProviderClient, ProviderConfig};

mod coingecko;
mod coinmarketcap;
mod coinpaprika;
mod cryptocompare;
mod http;
mod num;

pub use coingecko::CoinGecko;
pub use coinmarketcap::CoinMarketCap;
pub use coinpaprika::CoinPaprika;
pub use cryptocompare::CryptoCompare;

/// All four vendors with their default configs, in priority order.
///
/// `coinmarketcap_key` is attached to the CoinMarketCap config; without it that
/// provider fails every call as unavailable and is eventually deprioritized.
///
/// # Errors
/// Propagates client construction failures.
pub fn standard(
    coinmarketcap_key: Option<String>,
) -> Result<Vec<(Arc<dyn ProviderClient>, ProviderConfig)>, CoinsightError> {
    let gecko = CoinGecko::default_config();
    let mut cmc = CoinMarketCap::default_config();
    cmc.api_key = coinmarketcap_key;
    let paprika = CoinPaprika::default_config();
    let compare = CryptoCompare::default_config();
    let gecko_client: Arc<dyn ProviderClient> = Arc::new(CoinGecko::new(&gecko)?);
    let cmc_client: Arc<dyn ProviderClient> = Arc::new(CoinMarketCap::new(&cmc)?);
    let paprika_client: Arc<dyn ProviderClient> = Arc::new(CoinPaprika::new(&paprika)?);
    let compare_client: Arc<dyn ProviderClient> = Arc::new(CryptoCompare::new(&compare)?);
    Ok(vec![
        (gecko_client, gecko),
        (cmc_client, cmc),
        (paprika_client, paprika),
        (compare_client, compare),
    ])
}

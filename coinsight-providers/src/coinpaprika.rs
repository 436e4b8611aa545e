use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use coinsight_core::{
    CoinsightError, CryptoIdentity, DataSnapshot, Decimal, DirectoryEntry, ProviderClient,
    ProviderConfig, match_directory, require_provider_id, resolve_from_directory,
};
use serde::Deserialize;

use crate::http::Http;
use crate::num::opt_decimal;

/// CoinPaprika API v1. Works keyless; a key is sent as `Authorization`.
pub struct CoinPaprika {
    http: Http,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    currencies: Vec<Listing>,
}

#[derive(Debug, Deserialize)]
struct Listing {
    id: String,
    name: String,
    symbol: String,
    #[serde(default = "active")]
    is_active: bool,
}

const fn active() -> bool {
    true
}

fn entries(listings: Vec<Listing>) -> Vec<DirectoryEntry> {
    listings
        .into_iter()
        .filter(|l| l.is_active)
        .map(|l| DirectoryEntry::new(l.id, l.symbol, l.name))
        .collect()
}

#[derive(Debug, Deserialize)]
struct Ticker {
    id: String,
    name: String,
    symbol: String,
    #[serde(default)]
    rank: Option<u32>,
    #[serde(default, deserialize_with = "opt_decimal")]
    circulating_supply: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    total_supply: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    max_supply: Option<Decimal>,
    #[serde(default)]
    quotes: HashMap<String, UsdQuote>,
}

#[derive(Debug, Deserialize)]
struct UsdQuote {
    #[serde(default, deserialize_with = "opt_decimal")]
    price: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    volume_24h: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    market_cap: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    percent_change_24h: Option<Decimal>,
}

impl CoinPaprika {
    /// Registry name.
    pub const NAME: &'static str = "coinpaprika";

    /// Public endpoint, priority 3, 25 requests per minute.
    #[must_use]
    pub fn default_config() -> ProviderConfig {
        ProviderConfig::new("https://api.coinpaprika.com/v1")
            .with_priority(3)
            .with_rate_limit(25, Duration::from_secs(60))
    }

    /// Build a client from `cfg`.
    ///
    /// # Errors
    /// Returns `InvalidArg` when the base URL does not parse.
    pub fn new(cfg: &ProviderConfig) -> Result<Self, CoinsightError> {
        let mut http = Http::new(Self::NAME, cfg)?;
        if let Some(key) = &cfg.api_key {
            http = http.with_header("authorization", key.as_str());
        }
        Ok(Self { http })
    }
}

#[async_trait]
impl ProviderClient for CoinPaprika {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn vendor(&self) -> &'static str {
        "CoinPaprika"
    }

    async fn resolve_identity(&self, query: &str) -> Result<CryptoIdentity, CoinsightError> {
        let search: SearchResponse = self
            .http
            .get_json(
                "/search",
                &[("q", query.trim()), ("c", "currencies"), ("limit", "10")],
            )
            .await?;
        let found = entries(search.currencies);
        if match_directory(&found, query).is_some() {
            return resolve_from_directory(Self::NAME, query, &found);
        }
        // search ranks fuzzily; the full list is authoritative
        let all: Vec<Listing> = self.http.get_json("/coins", &[]).await?;
        resolve_from_directory(Self::NAME, query, &entries(all))
    }

    async fn fetch_data(&self, identity: &CryptoIdentity) -> Result<DataSnapshot, CoinsightError> {
        let id = require_provider_id(Self::NAME, identity)?;
        let mut t: Ticker = self.http.get_json(&format!("/tickers/{id}"), &[]).await?;
        let usd = t.quotes.remove("USD");
        let (price, volume, cap, pct) = usd.map_or((None, None, None, None), |q| {
            (q.price, q.volume_24h, q.market_cap, q.percent_change_24h)
        });
        Ok(DataSnapshot {
            current_price: price,
            market_cap: cap,
            volume_24h: volume,
            percent_change_24h: pct,
            circulating_supply: t.circulating_supply,
            total_supply: t.total_supply,
            max_supply: t.max_supply,
            market_cap_rank: t.rank,
            image_url: Some(format!(
                "https://static.coinpaprika.com/coin/{}/logo.png",
                t.id
            )),
            ..DataSnapshot::live(Self::NAME, &t.symbol, t.name)
        })
    }
}

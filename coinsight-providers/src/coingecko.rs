use std::time::Duration;

use async_trait::async_trait;
use coinsight_core::{
    CoinsightError, CryptoIdentity, DataSnapshot, Decimal, DirectoryEntry, ProviderClient,
    ProviderConfig, require_provider_id, resolve_from_directory,
};
use serde::Deserialize;

use crate::http::Http;
use crate::num::opt_decimal;

/// CoinGecko public API v3.
pub struct CoinGecko {
    http: Http,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    coins: Vec<SearchCoin>,
}

#[derive(Debug, Deserialize)]
struct SearchCoin {
    id: String,
    symbol: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct CoinDetail {
    symbol: String,
    name: String,
    #[serde(default)]
    market_cap_rank: Option<u32>,
    #[serde(default)]
    image: Option<Image>,
    #[serde(default)]
    market_data: Option<MarketData>,
}

#[derive(Debug, Deserialize)]
struct Image {
    #[serde(default)]
    large: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Usd {
    #[serde(default, deserialize_with = "opt_decimal")]
    usd: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct MarketData {
    #[serde(default)]
    current_price: Usd,
    #[serde(default)]
    market_cap: Usd,
    #[serde(default)]
    total_volume: Usd,
    #[serde(default, deserialize_with = "opt_decimal")]
    price_change_24h: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    price_change_percentage_24h: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    circulating_supply: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    total_supply: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    max_supply: Option<Decimal>,
}

impl CoinGecko {
    /// Registry name.
    pub const NAME: &'static str = "coingecko";

    /// Public endpoint, priority 1, 30 requests per minute.
    #[must_use]
    pub fn default_config() -> ProviderConfig {
        ProviderConfig::new("https://api.coingecko.com/api/v3")
            .with_priority(1)
            .with_rate_limit(30, Duration::from_secs(60))
    }

    /// Build a client from `cfg`. An API key is sent as the demo-plan header.
    ///
    /// # Errors
    /// Returns `InvalidArg` when the base URL does not parse.
    pub fn new(cfg: &ProviderConfig) -> Result<Self, CoinsightError> {
        let mut http = Http::new(Self::NAME, cfg)?;
        if let Some(key) = &cfg.api_key {
            http = http.with_header("x-cg-demo-api-key", key.as_str());
        }
        Ok(Self { http })
    }
}

#[async_trait]
impl ProviderClient for CoinGecko {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn vendor(&self) -> &'static str {
        "CoinGecko"
    }

    async fn resolve_identity(&self, query: &str) -> Result<CryptoIdentity, CoinsightError> {
        let resp: SearchResponse = self
            .http
            .get_json("/search", &[("query", query.trim())])
            .await?;
        let entries: Vec<DirectoryEntry> = resp
            .coins
            .into_iter()
            .map(|c| DirectoryEntry::new(c.id, c.symbol, c.name))
            .collect();
        resolve_from_directory(Self::NAME, query, &entries)
    }

    async fn fetch_data(&self, identity: &CryptoIdentity) -> Result<DataSnapshot, CoinsightError> {
        let id = require_provider_id(Self::NAME, identity)?;
        let path = format!("/coins/{id}");
        let coin: CoinDetail = self
            .http
            .get_json(
                &path,
                &[
                    ("localization", "false"),
                    ("tickers", "false"),
                    ("market_data", "true"),
                    ("community_data", "false"),
                    ("developer_data", "false"),
                    ("sparkline", "false"),
                ],
            )
            .await?;
        let md = coin.market_data.ok_or_else(|| {
            CoinsightError::unavailable(Self::NAME, format!("{path}: no market_data"))
        })?;
        Ok(DataSnapshot {
            current_price: md.current_price.usd,
            market_cap: md.market_cap.usd,
            volume_24h: md.total_volume.usd,
            price_change_24h: md.price_change_24h,
            percent_change_24h: md.price_change_percentage_24h,
            circulating_supply: md.circulating_supply,
            total_supply: md.total_supply,
            max_supply: md.max_supply,
            market_cap_rank: coin.market_cap_rank,
            image_url: coin.image.and_then(|i| i.large),
            ..DataSnapshot::live(Self::NAME, &coin.symbol, coin.name)
        })
    }
}

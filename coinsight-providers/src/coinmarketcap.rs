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

/// CoinMarketCap Pro API. Requires an API key.
pub struct CoinMarketCap {
    http: Http,
    has_key: bool,
}

#[derive(Debug, Deserialize)]
struct MapResponse {
    #[serde(default)]
    data: Vec<MapEntry>,
}

#[derive(Debug, Deserialize)]
struct MapEntry {
    id: u64,
    symbol: String,
    name: String,
}

impl From<MapEntry> for DirectoryEntry {
    fn from(e: MapEntry) -> Self {
        Self::new(e.id.to_string(), e.symbol, e.name)
    }
}

#[derive(Debug, Deserialize)]
struct QuotesResponse {
    #[serde(default)]
    data: HashMap<String, QuoteEntry>,
}

#[derive(Debug, Deserialize)]
struct QuoteEntry {
    symbol: String,
    name: String,
    #[serde(default)]
    cmc_rank: Option<u32>,
    #[serde(default, deserialize_with = "opt_decimal")]
    circulating_supply: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    total_supply: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    max_supply: Option<Decimal>,
    #[serde(default)]
    quote: HashMap<String, UsdQuote>,
}

#[derive(Debug, Deserialize)]
struct UsdQuote {
    #[serde(default, deserialize_with = "opt_decimal")]
    price: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    volume_24h: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    percent_change_24h: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    market_cap: Option<Decimal>,
}

impl CoinMarketCap {
    /// Registry name.
    pub const NAME: &'static str = "coinmarketcap";

    /// Pro endpoint, priority 2, 10 requests per minute.
    #[must_use]
    pub fn default_config() -> ProviderConfig {
        ProviderConfig::new("https://pro-api.coinmarketcap.com")
            .with_priority(2)
            .with_rate_limit(10, Duration::from_secs(60))
    }

    /// Build a client from `cfg`.
    ///
    /// Without `api_key` every call fails as unavailable without touching the network.
    ///
    /// # Errors
    /// Returns `InvalidArg` when the base URL does not parse.
    pub fn new(cfg: &ProviderConfig) -> Result<Self, CoinsightError> {
        let mut http = Http::new(Self::NAME, cfg)?;
        if let Some(key) = &cfg.api_key {
            http = http.with_header("x-cmc_pro_api_key", key.as_str());
        }
        Ok(Self {
            http,
            has_key: cfg.api_key.is_some(),
        })
    }

    fn require_key(&self) -> Result<(), CoinsightError> {
        if self.has_key {
            Ok(())
        } else {
            Err(CoinsightError::unavailable(Self::NAME, "no api key configured"))
        }
    }
}

#[async_trait]
impl ProviderClient for CoinMarketCap {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn vendor(&self) -> &'static str {
        "CoinMarketCap"
    }

    async fn resolve_identity(&self, query: &str) -> Result<CryptoIdentity, CoinsightError> {
        self.require_key()?;
        let symbol = query.trim().to_uppercase();
        // unknown symbols answer 400
        let by_symbol: Option<MapResponse> = self
            .http
            .get_json_or_missing("/v1/cryptocurrency/map", &[("symbol", symbol.as_str())])
            .await?;
        let by_symbol: Vec<DirectoryEntry> = by_symbol
            .map(|r| r.data.into_iter().map(Into::into).collect())
            .unwrap_or_default();
        if match_directory(&by_symbol, query).is_some() {
            return resolve_from_directory(Self::NAME, query, &by_symbol);
        }

        let listing: MapResponse = self
            .http
            .get_json(
                "/v1/cryptocurrency/map",
                &[("listing_status", "active"), ("limit", "5000")],
            )
            .await?;
        let listing: Vec<DirectoryEntry> = listing.data.into_iter().map(Into::into).collect();
        resolve_from_directory(Self::NAME, query, &listing)
    }

    async fn fetch_data(&self, identity: &CryptoIdentity) -> Result<DataSnapshot, CoinsightError> {
        let id = require_provider_id(Self::NAME, identity)?;
        self.require_key()?;
        let mut resp: QuotesResponse = self
            .http
            .get_json(
                "/v2/cryptocurrency/quotes/latest",
                &[("id", id), ("convert", "USD")],
            )
            .await?;
        let mut entry = resp.data.remove(id).ok_or_else(|| {
            CoinsightError::unavailable(Self::NAME, format!("quotes/latest: no entry for id {id}"))
        })?;
        let usd = entry.quote.remove("USD");
        let (price, volume, pct, cap) = usd.map_or((None, None, None, None), |q| {
            (q.price, q.volume_24h, q.percent_change_24h, q.market_cap)
        });
        Ok(DataSnapshot {
            current_price: price,
            market_cap: cap,
            volume_24h: volume,
            percent_change_24h: pct,
            circulating_supply: entry.circulating_supply,
            total_supply: entry.total_supply,
            max_supply: entry.max_supply,
            market_cap_rank: entry.cmc_rank,
            image_url: Some(format!(
                "https://s2.coinmarketcap.com/static/img/coins/64x64/{id}.png"
            )),
            ..DataSnapshot::live(Self::NAME, &entry.symbol, entry.name)
        })
    }
}

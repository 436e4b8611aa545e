use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use coinsight_core::{
    CoinsightError, CryptoIdentity, DataSnapshot, Decimal, DirectoryEntry, ProviderClient,
    ProviderConfig, require_provider_id, resolve_from_directory,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::http::Http;
use crate::num::opt_decimal;

/// CryptoCompare min-api. Coin ids are the CryptoCompare symbols themselves.
pub struct CryptoCompare {
    http: Http,
}

/// CryptoCompare reports most failures as HTTP 200 with `"Response": "Error"`.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "Response", default)]
    response: Option<String>,
    #[serde(rename = "Message", default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CoinList {
    #[serde(rename = "Data", default)]
    data: BTreeMap<String, Coin>,
}

#[derive(Debug, Deserialize)]
struct Coin {
    #[serde(rename = "Symbol")]
    symbol: String,
    #[serde(rename = "CoinName")]
    coin_name: String,
}

#[derive(Debug, Deserialize)]
struct PriceMulti {
    #[serde(rename = "RAW", default)]
    raw: HashMap<String, HashMap<String, RawQuote>>,
}

#[derive(Debug, Deserialize)]
struct RawQuote {
    #[serde(rename = "PRICE", default, deserialize_with = "opt_decimal")]
    price: Option<Decimal>,
    #[serde(rename = "MKTCAP", default, deserialize_with = "opt_decimal")]
    market_cap: Option<Decimal>,
    #[serde(rename = "TOTALVOLUME24HTO", default, deserialize_with = "opt_decimal")]
    volume_24h: Option<Decimal>,
    #[serde(rename = "CHANGE24HOUR", default, deserialize_with = "opt_decimal")]
    change_24h: Option<Decimal>,
    #[serde(rename = "CHANGEPCT24HOUR", default, deserialize_with = "opt_decimal")]
    change_pct_24h: Option<Decimal>,
    #[serde(rename = "CIRCULATINGSUPPLY", default, deserialize_with = "opt_decimal")]
    circulating_supply: Option<Decimal>,
    #[serde(rename = "SUPPLY", default, deserialize_with = "opt_decimal")]
    supply: Option<Decimal>,
    #[serde(rename = "IMAGEURL", default)]
    image_url: Option<String>,
}

impl CryptoCompare {
    /// Registry name.
    pub const NAME: &'static str = "cryptocompare";

    /// Public endpoint, priority 4, 100 requests per minute.
    #[must_use]
    pub fn default_config() -> ProviderConfig {
        ProviderConfig::new("https://min-api.cryptocompare.com")
            .with_priority(4)
            .with_rate_limit(100, Duration::from_secs(60))
    }

    /// Build a client from `cfg`. An API key travels as the `api_key` query parameter.
    ///
    /// # Errors
    /// Returns `InvalidArg` when the base URL does not parse.
    pub fn new(cfg: &ProviderConfig) -> Result<Self, CoinsightError> {
        let mut http = Http::new(Self::NAME, cfg)?;
        if let Some(key) = &cfg.api_key {
            http = http.with_param("api_key", key.as_str());
        }
        Ok(Self { http })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, CoinsightError> {
        let body: serde_json::Value = self.http.get_json(path, query).await?;
        let envelope = Envelope::deserialize(&body).map_err(|e| {
            CoinsightError::unavailable(Self::NAME, format!("GET {path}: decode: {e}"))
        })?;
        if envelope.response.as_deref() == Some("Error") {
            let msg = envelope.message.unwrap_or_default();
            if msg.to_ascii_lowercase().contains("rate limit") {
                return Err(CoinsightError::rate_limited(Self::NAME, None));
            }
            return Err(CoinsightError::unavailable(
                Self::NAME,
                format!("GET {path}: {msg}"),
            ));
        }
        serde_json::from_value(body).map_err(|e| {
            CoinsightError::unavailable(Self::NAME, format!("GET {path}: decode: {e}"))
        })
    }
}

#[async_trait]
impl ProviderClient for CryptoCompare {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn vendor(&self) -> &'static str {
        "CryptoCompare"
    }

    async fn resolve_identity(&self, query: &str) -> Result<CryptoIdentity, CoinsightError> {
        let list: CoinList = self.get("/data/all/coinlist", &[]).await?;
        let entries: Vec<DirectoryEntry> = list
            .data
            .into_values()
            .map(|c| DirectoryEntry::new(c.symbol.clone(), c.symbol, c.coin_name))
            .collect();
        resolve_from_directory(Self::NAME, query, &entries)
    }

    async fn fetch_data(&self, identity: &CryptoIdentity) -> Result<DataSnapshot, CoinsightError> {
        let sym = require_provider_id(Self::NAME, identity)?;
        let mut resp: PriceMulti = self
            .get("/data/pricemultifull", &[("fsyms", sym), ("tsyms", "USD")])
            .await?;
        let q = resp
            .raw
            .remove(sym)
            .and_then(|mut by_currency| by_currency.remove("USD"))
            .ok_or_else(|| {
                CoinsightError::unavailable(
                    Self::NAME,
                    format!("pricemultifull: no USD row for {sym}"),
                )
            })?;
        Ok(DataSnapshot {
            current_price: q.price,
            market_cap: q.market_cap,
            volume_24h: q.volume_24h,
            price_change_24h: q.change_24h,
            percent_change_24h: q.change_pct_24h,
            circulating_supply: q.circulating_supply,
            total_supply: q.supply,
            image_url: q
                .image_url
                .map(|path| format!("https://www.cryptocompare.com{path}")),
            ..DataSnapshot::live(Self::NAME, sym, identity.name())
        })
    }
}

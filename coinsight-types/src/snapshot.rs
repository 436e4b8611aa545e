//! Normalized market snapshots.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Source tag carried by snapshots served from the static fallback set.
pub const FALLBACK_SOURCE: &str = "fallback";

/// A normalized bag of market fields produced by exactly one provider.
///
/// Every market field is optional since providers expose different subsets.
/// Snapshots are shared as `Arc<DataSnapshot>` once produced and are replaced,
/// never updated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSnapshot {
    /// Uppercase ticker symbol.
    pub symbol: String,
    /// Display name.
    pub name: String,
    /// Provider that produced every populated field.
    pub source: String,
    /// When the snapshot was captured.
    pub captured_at: DateTime<Utc>,
    /// Last price in USD.
    pub current_price: Option<Decimal>,
    /// Market capitalization in USD.
    pub market_cap: Option<Decimal>,
    /// Trading volume over the last 24 hours in USD.
    pub volume_24h: Option<Decimal>,
    /// Absolute price change over the last 24 hours in USD.
    pub price_change_24h: Option<Decimal>,
    /// Relative price change over the last 24 hours, in percent.
    pub percent_change_24h: Option<Decimal>,
    /// Circulating supply.
    pub circulating_supply: Option<Decimal>,
    /// Total supply.
    pub total_supply: Option<Decimal>,
    /// Maximum supply.
    pub max_supply: Option<Decimal>,
    /// Rank by market capitalization.
    pub market_cap_rank: Option<u32>,
    /// Logo URL.
    pub image_url: Option<String>,
    /// `false` for curated fallback data.
    pub is_real_data: bool,
    /// `true` when served in degraded mode.
    pub fallback_mode: bool,
}

impl DataSnapshot {
    /// A live snapshot with no market fields set, captured now.
    ///
    /// Providers fill the fields with struct update syntax:
    ///
    /// ```
    /// use coinsight_types::DataSnapshot;
    /// use rust_decimal::Decimal;
    ///
    /// let snap = DataSnapshot {
    ///     current_price: Some(Decimal::new(320_050, 2)),
    ///     ..DataSnapshot::live("coingecko", "eth", "Ethereum")
    /// };
    /// assert_eq!(snap.symbol, "ETH");
    /// assert!(snap.is_real_data);
    /// ```
    pub fn live(source: impl Into<String>, symbol: &str, name: impl Into<String>) -> Self {
        Self {
            symbol: symbol.trim().to_uppercase(),
            name: name.into(),
            source: source.into(),
            captured_at: Utc::now(),
            current_price: None,
            market_cap: None,
            volume_24h: None,
            price_change_24h: None,
            percent_change_24h: None,
            circulating_supply: None,
            total_supply: None,
            max_supply: None,
            market_cap_rank: None,
            image_url: None,
            is_real_data: true,
            fallback_mode: false,
        }
    }

    /// A curated snapshot flagged as degraded data.
    pub fn fallback(symbol: &str, name: impl Into<String>) -> Self {
        Self {
            is_real_data: false,
            fallback_mode: true,
            ..Self::live(FALLBACK_SOURCE, symbol, name)
        }
    }

    /// Age of the snapshot relative to `now`, saturating at zero.
    #[must_use]
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        (now - self.captured_at).max(chrono::Duration::zero())
    }
}

/// How the snapshot returned by a resolution was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Freshness {
    /// Fetched from a provider for this call (or a coalesced concurrent call).
    Live,
    /// Served from the cache within its TTL.
    Cached,
    /// Served from an earlier cache entry because no provider could answer.
    Stale,
    /// Served from the static fallback set.
    Fallback,
}

impl Freshness {
    /// True when the data may be delayed or synthetic.
    #[must_use]
    pub const fn is_degraded(self) -> bool {
        matches!(self, Self::Stale | Self::Fallback)
    }
}

use std::sync::Arc;

use coinsight_core::{DataSnapshot, Decimal};
use rust_decimal_macros::dec;

/// One curated coin: (id, symbol, name, price, market cap, rank).
type Curated = (&'static str, &'static str, &'static str, Decimal, Decimal, u32);

const CURATED: [Curated; 10] = [
    ("bitcoin", "BTC", "Bitcoin", dec!(65000), dec!(1280000000000), 1),
    ("ethereum", "ETH", "Ethereum", dec!(3200), dec!(385000000000), 2),
    ("binancecoin", "BNB", "BNB", dec!(580), dec!(85000000000), 3),
    ("ripple", "XRP", "XRP", dec!(0.52), dec!(29000000000), 4),
    ("cardano", "ADA", "Cardano", dec!(0.45), dec!(16000000000), 5),
    ("dogecoin", "DOGE", "Dogecoin", dec!(0.12), dec!(17500000000), 6),
    ("solana", "SOL", "Solana", dec!(150), dec!(70000000000), 7),
    ("polygon", "MATIC", "Polygon", dec!(0.70), dec!(6500000000), 8),
    ("polkadot", "DOT", "Polkadot", dec!(6.50), dec!(9000000000), 9),
    ("chainlink", "LINK", "Chainlink", dec!(14), dec!(8500000000), 10),
];

/// Static last-resort snapshots for a handful of major coins.
///
/// Snapshots are flagged `is_real_data = false`, `fallback_mode = true` and
/// tagged with [`coinsight_core::FALLBACK_SOURCE`]. Lookups never touch the
/// network or any provider health.
#[derive(Debug, Clone)]
pub struct FallbackStore {
    coins: Vec<(&'static str, Arc<DataSnapshot>)>,
}

impl Default for FallbackStore {
    fn default() -> Self {
        Self::curated()
    }
}

impl FallbackStore {
    /// The built-in curated set.
    #[must_use]
    pub fn curated() -> Self {
        let coins = CURATED
            .iter()
            .map(|&(id, symbol, name, price, cap, rank)| {
                let snap = DataSnapshot {
                    current_price: Some(price),
                    market_cap: Some(cap),
                    market_cap_rank: Some(rank),
                    ..DataSnapshot::fallback(symbol, name)
                };
                (id, Arc::new(snap))
            })
            .collect();
        Self { coins }
    }

    /// A store with no entries.
    #[must_use]
    pub const fn empty() -> Self {
        Self { coins: Vec::new() }
    }

    /// Look up by symbol, display name, or coin id (all case-insensitive).
    #[must_use]
    pub fn get(&self, query: &str) -> Option<Arc<DataSnapshot>> {
        let q = query.trim();
        if q.is_empty() {
            return None;
        }
        self.coins
            .iter()
            .find(|(_, s)| s.symbol.eq_ignore_ascii_case(q))
            .or_else(|| {
                self.coins
                    .iter()
                    .find(|(id, s)| s.name.eq_ignore_ascii_case(q) || id.eq_ignore_ascii_case(q))
            })
            .map(|(_, s)| Arc::clone(s))
    }

    /// Number of curated coins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.coins.len()
    }

    /// True when the store has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.coins.is_empty()
    }
}

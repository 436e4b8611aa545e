use coinsight_core::{DataSnapshot, Decimal, DirectoryEntry};

/// The mock's coin directory: (id, symbol, name, price, market cap, rank).
const COINS: &[(&str, &str, &str, &str, &str, u32)] = &[
    ("bitcoin", "BTC", "Bitcoin", "65000.00", "1280000000000", 1),
    ("ethereum", "ETH", "Ethereum", "3200.50", "385000000000", 2),
    ("solana", "SOL", "Solana", "150.25", "70000000000", 5),
    ("dogecoin", "DOGE", "Dogecoin", "0.1234", "18000000000", 9),
    // forced behaviours keyed by symbol
    ("forced-failure", "FAIL", "Forced Failure", "1", "1", 9_998),
    ("forced-timeout", "TIMEOUT", "Forced Timeout", "1", "1", 9_999),
    ("forced-429", "RATELIMIT", "Forced Rate Limit", "1", "1", 10_000),
];

pub fn directory() -> Vec<DirectoryEntry> {
    COINS
        .iter()
        .map(|(id, sym, name, ..)| DirectoryEntry::new(*id, *sym, *name))
        .collect()
}

pub fn snapshot(source: &'static str, id: &str) -> Option<DataSnapshot> {
    let (_, sym, name, price, cap, rank) = COINS.iter().find(|c| c.0 == id)?;
    Some(DataSnapshot {
        current_price: price.parse::<Decimal>().ok(),
        market_cap: cap.parse::<Decimal>().ok(),
        market_cap_rank: Some(*rank),
        ..DataSnapshot::live(source, sym, *name)
    })
}

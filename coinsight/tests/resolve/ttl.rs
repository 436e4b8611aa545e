use std::time::Duration;

use coinsight::Freshness;
use rust_decimal_macros::dec;

use crate::helpers::{coinsight, mock, snap};

#[tokio::test(start_paused = true)]
async fn fresh_entry_skips_providers_until_ttl() {
    let a = mock("A");
    a.ctl
        .set_listing("sol", snap("SOL", "Solana", dec!(150.25)))
        .await;
    let cs = coinsight(&[(&a, 1)]);

    let first = cs.resolve("sol", false).await.unwrap();
    assert_eq!(first.freshness, Freshness::Live);

    tokio::time::advance(Duration::from_secs(59)).await;
    let cached = cs.resolve("SOL", false).await.unwrap();
    assert_eq!(cached.freshness, Freshness::Cached);
    assert_eq!(cached.snapshot, first.snapshot);
    assert_eq!(a.ctl.fetch_calls(), 1);

    tokio::time::advance(Duration::from_secs(2)).await;
    let refreshed = cs.resolve("sol", false).await.unwrap();
    assert_eq!(refreshed.freshness, Freshness::Live);
    assert_eq!(a.ctl.fetch_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn force_refresh_bypasses_fresh_entry() {
    let a = mock("A");
    a.ctl
        .set_listing("sol", snap("SOL", "Solana", dec!(150.25)))
        .await;
    let cs = coinsight(&[(&a, 1)]);

    cs.resolve("sol", false).await.unwrap();
    let forced = cs.resolve("sol", true).await.unwrap();
    assert_eq!(forced.freshness, Freshness::Live);
    assert_eq!(a.ctl.fetch_calls(), 2);
    // identities are memoized separately from snapshots
    assert_eq!(a.ctl.identity_calls(), 1);
}

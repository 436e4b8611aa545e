use std::sync::Arc;
use std::time::Duration;

use coinsight::{Coinsight, CoinsightError, FALLBACK_SOURCE, Freshness};
use rust_decimal_macros::dec;

use crate::helpers::{mock, pcfg, snap};

#[tokio::test(start_paused = true)]
async fn stale_snapshot_is_served_when_providers_fail() {
    let a = mock("A");
    a.ctl
        .set_listing("xrp", snap("XRP", "XRP", dec!(0.61)))
        .await;
    let cs = crate::helpers::coinsight(&[(&a, 1)]);

    let live = cs.resolve("xrp", false).await.unwrap();
    a.fail_fetch("XRP", CoinsightError::unavailable("A", "down"))
        .await;
    tokio::time::advance(Duration::from_secs(61)).await;

    let stale = cs.resolve("xrp", false).await.unwrap();
    assert_eq!(stale.freshness, Freshness::Stale);
    assert!(stale.is_degraded());
    assert!(Arc::ptr_eq(&stale.snapshot, &live.snapshot));
    assert!(stale.snapshot.is_real_data);
    // the failed refresh kept the old snapshot
    assert_eq!(cs.cache_stats().entries, 1);
}

#[tokio::test(start_paused = true)]
async fn fallback_is_served_for_curated_coins() {
    let a = mock("A");
    a.down_for("btc", "BTC").await;
    let cs = crate::helpers::coinsight(&[(&a, 1)]);

    let r = cs.resolve("btc", false).await.unwrap();
    assert_eq!(r.freshness, Freshness::Fallback);
    assert_eq!(r.snapshot.source, FALLBACK_SOURCE);
    assert_eq!(r.snapshot.symbol, "BTC");
    assert!(!r.snapshot.is_real_data);
    assert!(r.snapshot.fallback_mode);
    // fallback data never enters the cache
    assert_eq!(cs.cache_stats().entries, 0);
}

#[tokio::test(start_paused = true)]
async fn stale_can_be_disabled() {
    let a = mock("A");
    a.ctl
        .set_listing("bitcoin", snap("BTC", "Bitcoin", dec!(70000)))
        .await;
    let cs = Coinsight::builder()
        .with_provider(Arc::clone(&a.client), pcfg(1))
        .serve_stale(false)
        .build()
        .unwrap();

    cs.resolve("bitcoin", false).await.unwrap();
    a.fail_fetch("BTC", CoinsightError::unavailable("A", "down"))
        .await;

    let r = cs.resolve("bitcoin", true).await.unwrap();
    assert_eq!(r.freshness, Freshness::Fallback);
    assert_eq!(r.snapshot.current_price, Some(dec!(65000)));
}

#[tokio::test(start_paused = true)]
async fn uncurated_coin_surfaces_the_error() {
    let a = mock("A");
    a.down_for("pepe", "PEPE").await;
    let cs = crate::helpers::coinsight(&[(&a, 1)]);

    let err = cs.resolve("pepe", false).await.unwrap_err();
    match err {
        CoinsightError::NoProviderAvailable { query, attempts } => {
            assert_eq!(query, "pepe");
            assert!(matches!(
                attempts[..],
                [CoinsightError::ProviderUnavailable { .. }]
            ));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn not_found_is_never_masked_by_fallback() {
    let a = mock("A");
    let cs = crate::helpers::coinsight(&[(&a, 1)]);

    // "btc" is curated, but the provider answered that it does not exist
    let err = cs.resolve("btc", false).await.unwrap_err();
    assert!(matches!(err, CoinsightError::NotFound { .. }));
}

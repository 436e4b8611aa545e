use std::sync::Arc;
use std::time::Duration;

use coinsight::{CoinsightError, Freshness, WarmReport};
use rust_decimal_macros::dec;

use crate::helpers::{coinsight, mock, snap};

#[tokio::test(start_paused = true)]
async fn resolve_many_keeps_input_order() {
    let a = mock("A");
    a.ctl
        .set_listing("eth", snap("ETH", "Ethereum", dec!(3200.50)))
        .await;
    a.ctl
        .set_listing("btc", snap("BTC", "Bitcoin", dec!(65000)))
        .await;
    a.ctl.set_fetch_delay(Duration::from_millis(100)).await;
    let cs = coinsight(&[(&a, 1)]);

    let out = cs
        .resolve_many(["eth", " BTC ", "", "ETH", "unobtainium"], false)
        .await;

    assert_eq!(out.len(), 5);
    let eth = out[0].as_ref().unwrap();
    assert_eq!(eth.snapshot.symbol, "ETH");
    assert_eq!(out[1].as_ref().unwrap().snapshot.symbol, "BTC");
    assert!(matches!(out[2], Err(CoinsightError::InvalidArg(_))));
    // same normalized key, same fetch
    assert!(Arc::ptr_eq(&eth.snapshot, &out[3].as_ref().unwrap().snapshot));
    assert!(matches!(out[4], Err(CoinsightError::NotFound { .. })));
    assert_eq!(a.ctl.fetch_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn resolve_many_reuses_the_cache() {
    let a = mock("A");
    a.ctl
        .set_listing("sol", snap("SOL", "Solana", dec!(150)))
        .await;
    let cs = coinsight(&[(&a, 1)]);
    cs.resolve("sol", false).await.unwrap();

    let cached = cs.resolve_many(vec!["sol".to_string()], false).await;
    assert_eq!(cached[0].as_ref().unwrap().freshness, Freshness::Cached);

    let forced = cs.resolve_many(["sol"], true).await;
    assert_eq!(forced[0].as_ref().unwrap().freshness, Freshness::Live);
    assert_eq!(a.ctl.fetch_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn warm_fills_missing_entries_and_skips_fresh_ones() {
    let a = mock("A");
    a.ctl
        .set_listing("btc", snap("BTC", "Bitcoin", dec!(65000)))
        .await;
    a.ctl
        .set_listing("eth", snap("ETH", "Ethereum", dec!(3200.50)))
        .await;
    let cs = coinsight(&[(&a, 1)]);
    cs.resolve("btc", false).await.unwrap();

    let report = cs.warm(["BTC", "eth", " eth ", "unobtainium", "  "]).await;
    assert_eq!(
        report,
        WarmReport {
            fresh: 1,
            fetched: 1,
            failed: 1,
        }
    );
    assert_eq!(a.ctl.fetch_calls(), 2);

    let r = cs.resolve("eth", false).await.unwrap();
    assert_eq!(r.freshness, Freshness::Cached);
}

#[tokio::test(start_paused = true)]
async fn warm_refetches_entries_past_the_ttl() {
    let a = mock("A");
    a.ctl
        .set_listing("ada", snap("ADA", "Cardano", dec!(0.45)))
        .await;
    let cs = coinsight(&[(&a, 1)]);

    assert_eq!(cs.warm(["ada"]).await.fetched, 1);
    assert_eq!(cs.warm(["ada"]).await.fresh, 1);
    tokio::time::advance(Duration::from_secs(61)).await;
    assert_eq!(cs.warm(["ada"]).await.fetched, 1);
    assert_eq!(a.ctl.fetch_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn warm_stores_nothing_degraded() {
    let a = mock("A");
    a.down_for("btc", "BTC").await;
    let cs = coinsight(&[(&a, 1)]);

    let report = cs.warm(["btc"]).await;
    assert_eq!(report.failed, 1);
    assert_eq!(cs.cache_stats().entries, 0);

    // a caller still gets the curated snapshot
    let r = cs.resolve("btc", false).await.unwrap();
    assert_eq!(r.freshness, Freshness::Fallback);
}

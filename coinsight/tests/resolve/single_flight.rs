use std::sync::Arc;
use std::time::Duration;

use coinsight::Freshness;
use futures::future::join_all;
use rust_decimal_macros::dec;

use crate::helpers::{coinsight, mock, snap};

#[tokio::test(start_paused = true)]
async fn concurrent_resolves_share_one_fetch() {
    let a = mock("A");
    a.ctl
        .set_listing("bitcoin", snap("BTC", "Bitcoin", dec!(65000)))
        .await;
    a.ctl.set_fetch_delay(Duration::from_millis(250)).await;
    let cs = coinsight(&[(&a, 1)]);

    let results = join_all((0..16).map(|_| cs.resolve("bitcoin", false))).await;

    assert_eq!(a.ctl.identity_calls(), 1);
    assert_eq!(a.ctl.fetch_calls(), 1);
    let first = results[0].as_ref().unwrap();
    for r in &results {
        let r = r.as_ref().unwrap();
        assert_eq!(r.freshness, Freshness::Live);
        assert!(Arc::ptr_eq(&r.snapshot, &first.snapshot));
    }
    assert_eq!(cs.cache_stats().in_flight, 0);
    assert_eq!(cs.cache_stats().entries, 1);
}

#[tokio::test(start_paused = true)]
async fn query_spelling_shares_one_key() {
    let a = mock("A");
    a.ctl
        .set_listing("bitcoin", snap("BTC", "Bitcoin", dec!(65000)))
        .await;
    a.ctl.set_fetch_delay(Duration::from_millis(100)).await;
    let cs = coinsight(&[(&a, 1)]);

    let (x, y) = tokio::join!(cs.resolve("Bitcoin", false), cs.resolve("  BITCOIN ", false));
    assert!(Arc::ptr_eq(&x.unwrap().snapshot, &y.unwrap().snapshot));
    assert_eq!(a.ctl.fetch_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn force_refresh_joins_in_flight_fetch() {
    let a = mock("A");
    a.ctl
        .set_listing("eth", snap("ETH", "Ethereum", dec!(3200.50)))
        .await;
    a.ctl.set_fetch_delay(Duration::from_millis(100)).await;
    let cs = coinsight(&[(&a, 1)]);

    let (x, y) = tokio::join!(cs.resolve("eth", false), cs.resolve("eth", true));
    assert!(x.is_ok() && y.is_ok());
    assert_eq!(a.ctl.fetch_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn failed_fetch_is_not_cached() {
    let a = mock("A");
    a.down_for("dead", "DEAD").await;
    let cs = coinsight(&[(&a, 1)]);

    assert!(cs.resolve("dead", false).await.is_err());
    assert_eq!(cs.cache_stats().entries, 0);
    assert_eq!(cs.cache_stats().in_flight, 0);
}

use std::sync::Arc;
use std::time::Duration;

use coinsight::{Coinsight, Freshness};
use rust_decimal_macros::dec;

use crate::helpers::{mock, pcfg, snap};

#[tokio::test(start_paused = true)]
async fn slow_provider_times_out_and_next_one_serves() {
    let a = mock("A");
    let b = mock("B");
    for m in [&a, &b] {
        m.ctl
            .set_listing("sol", snap("SOL", "Solana", dec!(150.25)))
            .await;
    }
    a.ctl.set_fetch_delay(Duration::from_secs(5)).await;
    let cs = Coinsight::builder()
        .with_provider(
            Arc::clone(&a.client),
            pcfg(1).with_timeout(Duration::from_secs(1)),
        )
        .with_provider(Arc::clone(&b.client), pcfg(2))
        .build()
        .unwrap();

    let r = cs.resolve("sol", false).await.unwrap();
    assert_eq!(r.freshness, Freshness::Live);
    assert_eq!(r.snapshot.source, "B");

    let h = &cs.health_status()[0];
    assert_eq!(h.consecutive_failures, 1);
    assert_eq!(cs.provider_order(), ["B", "A"]);
}

#[tokio::test(start_paused = true)]
async fn request_timeout_degrades_while_fetch_completes() {
    let a = mock("A");
    a.ctl
        .set_listing("bitcoin", snap("BTC", "Bitcoin", dec!(70000)))
        .await;
    a.ctl.set_fetch_delay(Duration::from_secs(5)).await;
    let cs = Coinsight::builder()
        .with_provider(Arc::clone(&a.client), pcfg(1))
        .request_timeout(Duration::from_secs(2))
        .build()
        .unwrap();

    let r = cs.resolve("bitcoin", false).await.unwrap();
    assert_eq!(r.freshness, Freshness::Fallback);
    assert_eq!(cs.cache_stats().in_flight, 1);

    tokio::time::sleep(Duration::from_secs(4)).await;
    let r = cs.resolve("bitcoin", false).await.unwrap();
    assert_eq!(r.freshness, Freshness::Cached);
    assert_eq!(r.snapshot.source, "A");
    assert_eq!(r.snapshot.current_price, Some(dec!(70000)));
    assert_eq!(a.ctl.fetch_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn request_timeout_without_fallback_is_an_error() {
    let a = mock("A");
    a.ctl
        .set_listing("pepe", snap("PEPE", "Pepe", dec!(0.00001)))
        .await;
    a.ctl.set_fetch_delay(Duration::from_secs(5)).await;
    let cs = Coinsight::builder()
        .with_provider(Arc::clone(&a.client), pcfg(1))
        .request_timeout(Duration::from_secs(2))
        .build()
        .unwrap();

    let err = cs.resolve("pepe", false).await.unwrap_err();
    assert!(matches!(err, coinsight::CoinsightError::RequestTimeout { .. }));
}

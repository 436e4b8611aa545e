use coinsight::{CoinsightError, DataSnapshot, Freshness};
use coinsight_mock::MockBehavior;
use rust_decimal_macros::dec;

use crate::helpers::{coinsight, mock, snap};

#[tokio::test]
async fn unlisted_then_listed_returns_second_provider_verbatim() {
    let a = mock("A");
    let b = mock("B");
    b.ctl
        .set_listing("eth", snap("ETH", "Ethereum", dec!(3200.50)))
        .await;
    let cs = coinsight(&[(&a, 1), (&b, 2)]);

    let r = cs.resolve("ETH", false).await.unwrap();
    assert_eq!(r.freshness, Freshness::Live);
    assert_eq!(r.snapshot.source, "B");
    assert_eq!(r.snapshot.current_price, Some(dec!(3200.50)));
    assert!(r.snapshot.is_real_data);
    assert!(!r.snapshot.fallback_mode);

    let health = cs.health_status();
    let (ha, hb) = (&health[0], &health[1]);
    assert_eq!((ha.provider.as_str(), hb.provider.as_str()), ("A", "B"));
    assert_eq!(ha.consecutive_failures, 0);
    assert_eq!(hb.consecutive_failures, 0);
    // the miss still spent one of A's requests
    assert_eq!(ha.requests_in_window, 1);
    assert_eq!(a.ctl.fetch_calls(), 0);
}

#[tokio::test]
async fn first_success_stops_the_walk() {
    let a = mock("A");
    let b = mock("B");
    a.ctl
        .set_listing("btc", snap("BTC", "Bitcoin", dec!(65000)))
        .await;
    b.ctl
        .set_listing("btc", snap("BTC", "Bitcoin", dec!(64999)))
        .await;
    let cs = coinsight(&[(&a, 1), (&b, 2)]);

    let r = cs.resolve("btc", false).await.unwrap();
    assert_eq!(r.snapshot.source, "A");
    assert_eq!(b.ctl.identity_calls(), 0);
    assert_eq!(cs.health_status()[1].requests_in_window, 0);
}

#[tokio::test]
async fn snapshot_with_foreign_source_is_rejected() {
    let a = mock("A");
    let b = mock("B");
    // A lists ETH but hands back a snapshot attributed to someone else
    a.ctl
        .set_listing("eth", snap("ETH", "Ethereum", dec!(1)))
        .await;
    a.ctl
        .set_fetch_behavior(
            "ETH",
            MockBehavior::Return(DataSnapshot {
                current_price: Some(dec!(1)),
                ..DataSnapshot::live("Z", "ETH", "Ethereum")
            }),
        )
        .await;
    b.ctl
        .set_listing("eth", snap("ETH", "Ethereum", dec!(3200.50)))
        .await;
    let cs = coinsight(&[(&a, 1), (&b, 2)]);

    let r = cs.resolve("eth", false).await.unwrap();
    assert_eq!(r.snapshot.source, "B");
    assert_eq!(r.snapshot.current_price, Some(dec!(3200.50)));
    assert_eq!(cs.health_status()[0].consecutive_failures, 1);
}

#[tokio::test]
async fn every_provider_missing_is_not_found() {
    let a = mock("A");
    let b = mock("B");
    let cs = coinsight(&[(&a, 1), (&b, 2)]);

    let err = cs.resolve("unobtainium", false).await.unwrap_err();
    assert!(matches!(err, CoinsightError::NotFound { .. }), "{err:?}");
    assert!(cs.health_status().iter().all(|h| h.consecutive_failures == 0));
}

#[tokio::test]
async fn blank_query_is_rejected() {
    let a = mock("A");
    let cs = coinsight(&[(&a, 1)]);
    let err = cs.resolve("   ", false).await.unwrap_err();
    assert!(matches!(err, CoinsightError::InvalidArg(_)));
    assert_eq!(a.ctl.identity_calls(), 0);
}

use std::sync::Arc;
use std::time::Duration;

use coinsight::{Coinsight, Freshness};
use rust_decimal_macros::dec;

use crate::helpers::{mock, pcfg, snap};

const MINUTE: Duration = Duration::from_secs(60);

#[tokio::test(start_paused = true)]
async fn sweep_evicts_entries_past_max_age() {
    let a = mock("A");
    a.ctl
        .set_listing("link", snap("LINK", "Chainlink", dec!(14)))
        .await;
    let cs = Coinsight::builder()
        .with_provider(Arc::clone(&a.client), pcfg(1))
        .cache_max_age(10 * MINUTE)
        .sweep_interval(MINUTE)
        .build()
        .unwrap();
    let _maintenance = cs.spawn_maintenance();

    cs.resolve("link", false).await.unwrap();
    tokio::time::sleep(5 * MINUTE).await;
    // past the TTL but still within max age
    assert_eq!(cs.cache_stats().entries, 1);

    tokio::time::sleep(6 * MINUTE).await;
    assert_eq!(cs.cache_stats().entries, 0);

    // with the entry gone there is nothing stale to fall back on
    a.fail_fetch("LINK", coinsight::CoinsightError::unavailable("A", "down"))
        .await;
    let r = cs.resolve("link", false).await.unwrap();
    assert_eq!(r.freshness, Freshness::Fallback);
}

#[tokio::test(start_paused = true)]
async fn periodic_reset_clears_backoff_but_not_the_circuit() {
    let a = mock("A");
    let b = mock("B");
    a.down_for("dead", "DEAD").await;
    let cs = Coinsight::builder()
        .with_provider(Arc::clone(&a.client), pcfg(1))
        .with_provider(Arc::clone(&b.client), pcfg(2))
        .health_reset_interval(5 * MINUTE)
        .build()
        .unwrap();
    let _maintenance = cs.spawn_maintenance();

    let _ = cs.resolve("dead", false).await;
    let h = &cs.health_status()[0];
    assert_eq!(h.consecutive_failures, 1);
    assert_eq!(h.requests_in_window, 1);

    tokio::time::sleep(6 * MINUTE).await;
    let h = &cs.health_status()[0];
    assert_eq!(h.backoff_failures, 0);
    assert_eq!(h.requests_in_window, 0);
    assert_eq!(h.backoff_remaining_ms, 0);
    // the breaker's own count survives, and status agrees with the ordering
    assert_eq!(h.circuit_failures, 1);
    assert_eq!(h.consecutive_failures, 1);
    assert_eq!(cs.provider_order(), ["B", "A"]);
}

#[tokio::test(start_paused = true)]
async fn reported_failures_match_ordering_after_manual_reset() {
    let a = mock("A");
    let b = mock("B");
    a.down_for("dead", "DEAD").await;
    b.down_for("dead", "DEAD").await;
    let cs = Coinsight::builder()
        .with_provider(Arc::clone(&a.client), pcfg(1))
        .with_provider(Arc::clone(&b.client), pcfg(2))
        .build()
        .unwrap();

    let _ = cs.resolve("dead", false).await;
    cs.reset_health_counters();

    for h in cs.health_status() {
        assert_eq!(h.consecutive_failures, 1, "{}", h.provider);
        assert_eq!(h.backoff_failures, 0, "{}", h.provider);
    }
    // both demoted equally, so priority decides
    assert_eq!(cs.provider_order(), ["A", "B"]);

    cs.reset_circuits();
    assert!(cs.health_status().iter().all(|h| h.consecutive_failures == 0));
}

#[tokio::test(start_paused = true)]
async fn stopped_maintenance_no_longer_sweeps() {
    let a = mock("A");
    a.ctl
        .set_listing("link", snap("LINK", "Chainlink", dec!(14)))
        .await;
    let cs = Coinsight::builder()
        .with_provider(Arc::clone(&a.client), pcfg(1))
        .cache_max_age(MINUTE)
        .sweep_interval(MINUTE)
        .build()
        .unwrap();

    let handle = cs.spawn_maintenance();
    assert!(!handle.is_finished());
    handle.stop().await;

    cs.resolve("link", false).await.unwrap();
    tokio::time::sleep(10 * MINUTE).await;
    assert_eq!(cs.cache_stats().entries, 1);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_handle_stops_maintenance() {
    let a = mock("A");
    a.ctl
        .set_listing("link", snap("LINK", "Chainlink", dec!(14)))
        .await;
    let cs = Coinsight::builder()
        .with_provider(Arc::clone(&a.client), pcfg(1))
        .cache_max_age(MINUTE)
        .sweep_interval(MINUTE)
        .build()
        .unwrap();

    drop(cs.spawn_maintenance());

    cs.resolve("link", false).await.unwrap();
    tokio::time::sleep(10 * MINUTE).await;
    assert_eq!(cs.cache_stats().entries, 1);
}

#[tokio::test(start_paused = true)]
async fn popular_symbols_are_warmed_then_refreshed() {
    let a = mock("A");
    a.ctl
        .set_listing("btc", snap("BTC", "Bitcoin", dec!(65000)))
        .await;
    a.ctl
        .set_listing("eth", snap("ETH", "Ethereum", dec!(3200.50)))
        .await;
    let cs = Coinsight::builder()
        .with_provider(Arc::clone(&a.client), pcfg(1))
        .popular_symbols(["BTC", "eth", "unobtainium"])
        .refresh_interval(2 * MINUTE)
        .build()
        .unwrap();
    let _maintenance = cs.spawn_maintenance();

    // warmed on start
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(cs.cache_stats().entries, 2);
    assert_eq!(a.ctl.fetch_calls(), 2);
    let r = cs.resolve("btc", false).await.unwrap();
    assert_eq!(r.freshness, Freshness::Cached);

    // both entries are past the TTL at the next tick
    tokio::time::sleep(2 * MINUTE).await;
    assert_eq!(a.ctl.fetch_calls(), 4);
    let r = cs.resolve("eth", false).await.unwrap();
    assert_eq!(r.freshness, Freshness::Cached);
    assert_eq!(a.ctl.fetch_calls(), 4);
}

#[tokio::test(start_paused = true)]
async fn no_popular_symbols_means_no_refresh_calls() {
    let a = mock("A");
    a.ctl
        .set_listing("btc", snap("BTC", "Bitcoin", dec!(65000)))
        .await;
    let cs = Coinsight::builder()
        .with_provider(Arc::clone(&a.client), pcfg(1))
        .refresh_interval(MINUTE)
        .build()
        .unwrap();
    let _maintenance = cs.spawn_maintenance();

    tokio::time::sleep(10 * MINUTE).await;
    assert_eq!(a.ctl.identity_calls(), 0);
    assert_eq!(a.ctl.fetch_calls(), 0);
}

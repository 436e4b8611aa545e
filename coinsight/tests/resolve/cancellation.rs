use std::time::Duration;

use coinsight::Freshness;
use rust_decimal_macros::dec;

use crate::helpers::{coinsight, mock, snap};

#[tokio::test(start_paused = true)]
async fn abandoned_caller_does_not_cancel_the_fetch() {
    let a = mock("A");
    a.ctl
        .set_listing("ada", snap("ADA", "Cardano", dec!(0.45)))
        .await;
    a.ctl.set_fetch_delay(Duration::from_millis(500)).await;
    let cs = coinsight(&[(&a, 1)]);

    let caller = {
        let cs = cs.clone();
        tokio::spawn(async move { cs.resolve("ada", false).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    caller.abort();
    assert!(caller.await.unwrap_err().is_cancelled());

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(cs.cache_stats().entries, 1);
    assert_eq!(cs.cache_stats().in_flight, 0);

    let r = cs.resolve("ada", false).await.unwrap();
    assert_eq!(r.freshness, Freshness::Cached);
    assert_eq!(a.ctl.fetch_calls(), 1);
}

use std::time::Duration;

use coinsight::{Coinsight, CoinsightError, DataSnapshot, ProviderConfig};
use coinsight_mock::{DynamicMockProvider, MockBehavior};
use rust_decimal_macros::dec;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A scripted provider we can take down at will.
    let (client, ctl) = DynamicMockProvider::new_with_controller("scripted");
    let coinsight = Coinsight::builder()
        .with_provider(client, ProviderConfig::new("mock://").with_priority(1))
        .cache_ttl(Duration::from_millis(100))
        .build()?;

    ctl.set_listing(
        "xrp",
        DataSnapshot {
            current_price: Some(dec!(0.61)),
            ..DataSnapshot::live("scripted", "XRP", "XRP")
        },
    )
    .await;
    let live = coinsight.resolve("xrp", false).await?;
    println!("healthy:  {:?} price={:?}", live.freshness, live.snapshot.current_price);

    // Outage: the last known snapshot is served as stale.
    ctl.set_fetch_behavior(
        "XRP",
        MockBehavior::Fail(CoinsightError::unavailable("scripted", "503")),
    )
    .await;
    tokio::time::sleep(Duration::from_millis(150)).await;
    let stale = coinsight.resolve("xrp", false).await?;
    println!("outage:   {:?} price={:?}", stale.freshness, stale.snapshot.current_price);

    // Never cached, but curated: the static fallback set answers.
    ctl.set_identity_behavior(
        "btc",
        MockBehavior::Fail(CoinsightError::unavailable("scripted", "503")),
    )
    .await;
    let fallback = coinsight.resolve("btc", false).await?;
    println!(
        "fallback: {:?} source={} real={}",
        fallback.freshness, fallback.snapshot.source, fallback.snapshot.is_real_data
    );

    println!("{:#?}", fallback.snapshot);
    Ok(())
}

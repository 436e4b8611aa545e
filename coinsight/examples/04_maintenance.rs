mod common;
use std::time::Duration;

use coinsight::Coinsight;
use common::{init_tracing, providers};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG=coinsight=debug shows every provider attempt and sweep.
    init_tracing();

    let coinsight = Coinsight::builder()
        .with_providers(providers())
        .cache_ttl(Duration::from_secs(2))
        .cache_max_age(Duration::from_secs(5))
        .sweep_interval(Duration::from_secs(1))
        .popular_symbols(["btc", "eth", "sol"])
        .refresh_interval(Duration::from_secs(3))
        .build()?;
    // warms btc, eth and sol right away
    let maintenance = coinsight.spawn_maintenance();

    let batch = coinsight.resolve_many(["bitcoin", "doge"], false).await;
    for r in batch {
        match r {
            Ok(r) => {
                let s = &r.snapshot;
                println!("{} via {} ({:?})", s.symbol, s.source, r.freshness);
            }
            Err(e) => println!("error: {e}"),
        }
    }
    println!("after resolve: {:?}", coinsight.cache_stats());

    tokio::time::sleep(Duration::from_secs(7)).await;
    println!("after sweep:   {:?}", coinsight.cache_stats());

    maintenance.stop().await;
    Ok(())
}

mod common;
use coinsight::Coinsight;
use common::providers;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let coinsight = Coinsight::builder().with_providers(providers()).build()?;

    for query in ["btc", "sol", "doge", "definitely-not-a-coin"] {
        match coinsight.resolve(query, false).await {
            Ok(r) => println!(
                "{query:>24}: {} via {} ({:?})",
                r.snapshot.symbol, r.snapshot.source, r.freshness
            ),
            Err(e) => println!("{query:>24}: {e}"),
        }
    }

    println!("\nProvider order: {:?}", coinsight.provider_order());
    for h in coinsight.health_status() {
        println!(
            "{:<14} prio={} window={}/{} failures={} ({}/{}) circuit={} backoff={}ms",
            h.provider,
            h.priority,
            h.requests_in_window,
            h.max_requests,
            h.consecutive_failures,
            h.backoff_failures,
            h.circuit_failures,
            h.circuit_state,
            h.backoff_remaining_ms
        );
    }
    println!("Circuits: {:?}", coinsight.circuit_stats());
    println!("Cache: {:?}", coinsight.cache_stats());
    Ok(())
}

mod common;
use coinsight::Coinsight;
use common::providers;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Build the resolver over the bundled providers (mocks in CI).
    let coinsight = Coinsight::builder().with_providers(providers()).build()?;

    // 2. Resolve by symbol. The first healthy provider that knows the coin wins.
    println!("Resolving ETH...");
    let eth = coinsight.resolve("ETH", false).await?;
    println!(
        "{} ({}) from {} [{:?}]: {:?} USD",
        eth.snapshot.name, eth.snapshot.symbol, eth.snapshot.source, eth.freshness,
        eth.snapshot.current_price
    );

    // 3. Case and whitespace are normalized, so this hits the cache.
    let again = coinsight.resolve("  eth ", false).await?;
    println!("second lookup: {:?}", again.freshness);

    Ok(())
}

// Manual check against a live RPC endpoint: resolve a date (or Unix
// timestamp) to its nearest block and read the total collateral balance there.
//
//   cargo run --bin resolve_block -- 2024-05-01
//   cargo run --bin resolve_block -- 1714521600

use balance_snapshot_service::{
    blockchain::balances::{BalanceSources, FetchContext},
    cache::SnapshotCache,
    config::Config,
    db::connection,
    snapshot::{day_timestamp, units::to_display},
    validation::parse_date,
    BalanceFetcher, BalanceKind, BlockResolver, EvmClient,
};
use tracing::{info, Level};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_max_level(Level::DEBUG).init();

    let arg = std::env::args()
        .nth(1)
        .ok_or("usage: resolve_block <YYYY-MM-DD | unix timestamp>")?;
    let target = match arg.parse::<u64>() {
        Ok(timestamp) => timestamp,
        Err(_) => day_timestamp(parse_date(&arg)?),
    };

    let config = Config::from_env()?;
    let db_pool = connection::establish_connection(&config.database_url).await?;
    let cache = SnapshotCache::new(db_pool, config.cache_max_capacity);
    let client = EvmClient::new(&config)?;

    let resolver = BlockResolver::new(client.clone(), cache.clone());
    let block = resolver.resolve(target).await?;
    info!("✅ Nearest block to {}: {}", target, block);

    let fetcher = BalanceFetcher::new(
        client,
        cache,
        BalanceSources::from_config(&config),
        config.multicall_chunk_size,
    );
    let total = fetcher
        .fetch(BalanceKind::Total, block, FetchContext::default())
        .await?;
    info!(
        "✅ Total balance at block {}: {} ({})",
        block,
        total,
        to_display(total, config.unit_decimals)?
    );

    Ok(())
}

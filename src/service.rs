// Wires config, cache, chain client and subgraph into a report run.

use std::sync::Arc;
use tracing::info;

use crate::blockchain::balances::BalanceSources;
use crate::blockchain::client::EvmClient;
use crate::cache::legacy::{import_legacy_balance_cache, import_legacy_block_cache};
use crate::cache::{CacheError, SnapshotCache};
use crate::config::Config;
use crate::db::connection::establish_connection;
use crate::error::SnapshotError;
use crate::models::DailySnapshot;
use crate::snapshot::report::{render_rows, write_csv_file};
use crate::snapshot::{day_range, AggregatorOptions, SnapshotAggregator};
use crate::state::AppState;
use crate::subgraph::SubgraphClient;

/// Opens the cache database and carries over any legacy cache files.
pub async fn init_state(config: Config) -> Result<Arc<AppState>, SnapshotError> {
    let db_pool = establish_connection(&config.database_url)
        .await
        .map_err(CacheError::from)?;

    if let Some(path) = &config.legacy_block_cache {
        import_legacy_block_cache(&db_pool, path).await?;
    }
    if let Some(path) = &config.legacy_balance_cache {
        import_legacy_balance_cache(&db_pool, path, config.address_to_check).await?;
    }

    let cache = SnapshotCache::new(db_pool.clone(), config.cache_max_capacity);
    info!("Cache initialized with in-memory capacity: {}", config.cache_max_capacity);

    Ok(Arc::new(AppState {
        config,
        db_pool,
        cache,
    }))
}

/// Builds the daily report for the configured range and writes it as CSV.
pub async fn run_report(state: &AppState) -> Result<Vec<DailySnapshot>, SnapshotError> {
    let config = &state.config;

    let client = EvmClient::new(config)?;
    let subgraph = SubgraphClient::new(config)?;
    let aggregator = SnapshotAggregator::new(
        client,
        state.cache.clone(),
        BalanceSources::from_config(config),
        AggregatorOptions::from_config(config),
    );

    let days = day_range(config.start_date, config.end_date)?;
    let snapshots = aggregator.build_report(&days, &subgraph).await?;

    let rows = render_rows(&snapshots, config.unit_decimals)?;
    for row in &rows {
        info!(
            "{} | block {} | users {} | ours {} | total {}",
            row.date, row.block_number, row.user_balance, row.own_balance, row.total
        );
    }
    write_csv_file(&config.report_path, aggregator.components(), &rows)?;

    Ok(snapshots)
}

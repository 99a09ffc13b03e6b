pub mod blockchain;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod service;
pub mod snapshot;
pub mod state;
pub mod subgraph;
pub mod symbols;
pub mod validation;

#[cfg(test)]
pub mod tests;

// Re-export specific items for convenience
pub use blockchain::{BalanceFetcher, BlockResolver, EvmClient};
pub use cache::{CacheKey, SnapshotCache};
pub use error::SnapshotError;
pub use models::{BalanceKind, DailySnapshot};
pub use snapshot::SnapshotAggregator;
pub use validation::{parse_address_list, validate_evm_address};

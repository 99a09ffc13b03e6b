pub mod balances;
pub mod client;
pub mod contracts;
pub mod reader;
pub mod resolver;

// Re-exports for convenience
pub use balances::BalanceFetcher;
pub use client::EvmClient;
pub use resolver::BlockResolver;

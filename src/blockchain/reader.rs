//! Read-only views of the chain used by the resolver and the fetcher.
//!
//! Both are implemented by [`EvmClient`](super::client::EvmClient) and by the
//! in-memory fakes in the test suite.

use alloy::primitives::{Address, U256};
use std::future::Future;

use super::client::ClientError;

/// Block height and per-block timestamps.
///
/// Timestamps must be non-decreasing in block number.
pub trait BlockReader {
    fn latest_block_number(&self) -> impl Future<Output = Result<u64, ClientError>> + Send;

    fn block_timestamp(&self, block: u64) -> impl Future<Output = Result<u64, ClientError>> + Send;
}

/// A single balance-returning view call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BalanceCall {
    /// ERC-20 `balanceOf(owner)` on `token`
    TokenBalance { token: Address, owner: Address },
    /// Vault `balanceOf(party_b)`
    PartyBBalance { vault: Address, party_b: Address },
    /// Vault `allocatedBalanceOfPartyA(party_a)`
    AllocatedPartyA { vault: Address, party_a: Address },
    /// Vault `allocatedBalanceOfPartyB(party_b, party_a)`
    AllocatedPartyB {
        vault: Address,
        party_b: Address,
        party_a: Address,
    },
}

/// Balance reads pinned to a historical block.
pub trait BalanceReader {
    fn read(
        &self,
        call: BalanceCall,
        block: u64,
    ) -> impl Future<Output = Result<U256, ClientError>> + Send;

    /// Executes every call in one request, returning results in call order.
    fn read_batch(
        &self,
        calls: &[BalanceCall],
        block: u64,
    ) -> impl Future<Output = Result<Vec<U256>, ClientError>> + Send;
}

use alloy::primitives::{Address, U256};
use tracing::debug;

use super::reader::{BalanceCall, BalanceReader};
use crate::cache::{CacheKey, SnapshotCache};
use crate::config::Config;
use crate::error::SnapshotError;
use crate::models::BalanceKind;

/// Contract and account addresses the balance kinds are read from.
#[derive(Debug, Clone)]
pub struct BalanceSources {
    /// Collateral ERC-20 token
    pub collateral: Address,
    /// Holder of the collateral whose balance is the total
    pub vault_owner: Address,
    /// Vault contract holding party balances
    pub vault: Address,
    pub hedger: Address,
    pub liquidators: Vec<Address>,
}

impl BalanceSources {
    pub fn from_config(config: &Config) -> Self {
        Self {
            collateral: config.collateral_address,
            vault_owner: config.address_to_check,
            vault: config.symmio_address,
            hedger: config.hedger_address,
            liquidators: config.liquidator_addresses.clone(),
        }
    }
}

/// Auxiliary data some balance kinds need.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchContext<'a> {
    pub roster: Option<&'a [Address]>,
}

impl<'a> FetchContext<'a> {
    pub fn with_roster(roster: &'a [Address]) -> Self {
        Self {
            roster: Some(roster),
        }
    }
}

/// Reads balances at historical blocks, memoizing every result by
/// (kind, block).
pub struct BalanceFetcher<R> {
    reader: R,
    cache: SnapshotCache,
    sources: BalanceSources,
    chunk_size: usize,
}

impl<R: BalanceReader> BalanceFetcher<R> {
    pub fn new(reader: R, cache: SnapshotCache, sources: BalanceSources, chunk_size: usize) -> Self {
        Self {
            reader,
            cache,
            sources,
            chunk_size: chunk_size.max(1),
        }
    }

    pub async fn fetch(
        &self,
        kind: BalanceKind,
        block: u64,
        context: FetchContext<'_>,
    ) -> Result<U256, SnapshotError> {
        self.cache
            .get_or_try_insert_with(CacheKey::balance(kind, block), async {
                let balance = self.read_uncached(kind, block, context).await?;
                debug!("{:?} at block {}: {}", kind, block, balance);
                Ok::<_, SnapshotError>(balance)
            })
            .await
    }

    async fn read_uncached(
        &self,
        kind: BalanceKind,
        block: u64,
        context: FetchContext<'_>,
    ) -> Result<U256, SnapshotError> {
        let sources = &self.sources;

        match kind {
            BalanceKind::Total => {
                let call = BalanceCall::TokenBalance {
                    token: sources.collateral,
                    owner: sources.vault_owner,
                };
                Ok(self.reader.read(call, block).await?)
            }
            BalanceKind::PartyBBalance => {
                let call = BalanceCall::PartyBBalance {
                    vault: sources.vault,
                    party_b: sources.hedger,
                };
                Ok(self.reader.read(call, block).await?)
            }
            BalanceKind::PartyBAllocated => {
                let roster = context.roster.ok_or(SnapshotError::MissingRoster(kind))?;
                let calls: Vec<BalanceCall> = roster
                    .iter()
                    .map(|account| BalanceCall::AllocatedPartyB {
                        vault: sources.vault,
                        party_b: sources.hedger,
                        party_a: *account,
                    })
                    .collect();
                self.sum_batched(kind, &calls, block).await
            }
            BalanceKind::LiquidatorAllocated => {
                let calls: Vec<BalanceCall> = sources
                    .liquidators
                    .iter()
                    .map(|liquidator| BalanceCall::AllocatedPartyA {
                        vault: sources.vault,
                        party_a: *liquidator,
                    })
                    .collect();
                self.sum_batched(kind, &calls, block).await
            }
        }
    }

    /// Sums the results of `calls`, issuing one batched request per chunk.
    async fn sum_batched(
        &self,
        kind: BalanceKind,
        calls: &[BalanceCall],
        block: u64,
    ) -> Result<U256, SnapshotError> {
        let pages = calls.len().div_ceil(self.chunk_size);
        let mut total = U256::ZERO;

        for (page, chunk) in calls.chunks(self.chunk_size).enumerate() {
            let values = self.reader.read_batch(chunk, block).await?;
            for value in values {
                total = total
                    .checked_add(value)
                    .ok_or(SnapshotError::Overflow(kind))?;
            }
            debug!("{:?} at block {}: page {}/{} read", kind, block, page + 1, pages);
        }

        Ok(total)
    }
}

use alloy::primitives::{Address, I256, U256};
use backon::{ExponentialBuilder, Retryable};
use chrono::NaiveDate;
use futures::{future, StreamExt, TryStreamExt};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::day_timestamp;
use crate::blockchain::balances::{BalanceFetcher, BalanceSources, FetchContext};
use crate::blockchain::reader::{BalanceReader, BlockReader};
use crate::blockchain::resolver::BlockResolver;
use crate::cache::SnapshotCache;
use crate::config::{Config, FailurePolicy};
use crate::error::SnapshotError;
use crate::models::{BalanceKind, DailySnapshot};
use crate::subgraph::{fetch_roster, roster_addresses, RosterProvider};

#[derive(Debug, Clone)]
pub struct AggregatorOptions {
    /// Operator components subtracted from the total, in report order
    pub components: Vec<BalanceKind>,
    pub multicall_chunk_size: usize,
    pub roster_page_size: usize,
    pub day_concurrency: usize,
    pub day_retries: usize,
    pub retry_min_delay: Duration,
    pub failure_policy: FailurePolicy,
}

impl AggregatorOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            components: BalanceKind::COMPONENTS.to_vec(),
            multicall_chunk_size: config.multicall_chunk_size,
            roster_page_size: config.roster_page_size,
            day_concurrency: config.day_concurrency,
            day_retries: config.day_retries,
            retry_min_delay: Duration::from_secs(1),
            failure_policy: config.failure_policy,
        }
    }
}

/// Builds the per-day balance breakdown.
pub struct SnapshotAggregator<C> {
    resolver: BlockResolver<C>,
    fetcher: BalanceFetcher<C>,
    options: AggregatorOptions,
}

impl<C> SnapshotAggregator<C>
where
    C: BlockReader + BalanceReader + Clone,
{
    pub fn new(client: C, cache: SnapshotCache, sources: BalanceSources, options: AggregatorOptions) -> Self {
        let resolver = BlockResolver::new(client.clone(), cache.clone());
        let fetcher = BalanceFetcher::new(client, cache, sources, options.multicall_chunk_size);

        Self {
            resolver,
            fetcher,
            options,
        }
    }

    pub fn components(&self) -> &[BalanceKind] {
        &self.options.components
    }

    /// One snapshot per day, ascending by date. The roster is listed once,
    /// before any day is processed.
    pub async fn build_report<P: RosterProvider>(
        &self,
        days: &[NaiveDate],
        roster_provider: &P,
    ) -> Result<Vec<DailySnapshot>, SnapshotError> {
        let roster = self.load_roster(roster_provider).await?;
        let context = FetchContext::with_roster(&roster);

        let mut ordered = days.to_vec();
        ordered.sort_unstable();
        ordered.dedup();

        info!(
            "Building report for {} days ({} concurrent)",
            ordered.len(),
            self.options.day_concurrency
        );

        let snapshots: Vec<DailySnapshot> = futures::stream::iter(ordered)
            .map(|day| self.process_day(day, context))
            .buffered(self.options.day_concurrency.max(1))
            .try_filter_map(|snapshot| future::ready(Ok(snapshot)))
            .try_collect()
            .await?;

        info!("Report complete: {} snapshots", snapshots.len());
        Ok(snapshots)
    }

    async fn load_roster<P: RosterProvider>(&self, provider: &P) -> Result<Vec<Address>, SnapshotError> {
        if !self.options.components.iter().any(BalanceKind::needs_roster) {
            debug!("No component needs the account roster, skipping listing");
            return Ok(Vec::new());
        }

        info!("Fetching accounts...");
        let entries = fetch_roster(provider, self.options.roster_page_size).await?;
        info!("Total accounts fetched: {}", entries.len());
        Ok(roster_addresses(&entries)?)
    }

    /// Applies the retry and failure policy around a single day.
    async fn process_day(
        &self,
        day: NaiveDate,
        context: FetchContext<'_>,
    ) -> Result<Option<DailySnapshot>, SnapshotError> {
        let backoff = ExponentialBuilder::default()
            .with_min_delay(self.options.retry_min_delay)
            .with_max_times(self.options.day_retries);

        let result = (|| self.snapshot_day(day, context))
            .retry(backoff)
            .when(SnapshotError::is_transient)
            .notify(|err: &SnapshotError, delay: Duration| {
                warn!("Day {} failed: {}. Retrying in {:?}", day, err, delay);
            })
            .await;

        match (result, self.options.failure_policy) {
            (Ok(snapshot), _) => Ok(Some(snapshot)),
            (Err(err), FailurePolicy::SkipDay) => {
                warn!("Skipping day {}: {}", day, err);
                Ok(None)
            }
            (Err(err), FailurePolicy::Abort) => {
                error!("Aborting report at day {}: {}", day, err);
                Err(err)
            }
        }
    }

    pub async fn snapshot_day(
        &self,
        day: NaiveDate,
        context: FetchContext<'_>,
    ) -> Result<DailySnapshot, SnapshotError> {
        let block_number = self.resolver.resolve(day_timestamp(day)).await?;
        let total = self
            .fetcher
            .fetch(BalanceKind::Total, block_number, context)
            .await?;

        let mut components = Vec::with_capacity(self.options.components.len());
        if total.is_zero() {
            // An empty vault holds no operator balances either
            debug!("Total is zero at block {}, skipping component reads", block_number);
            components.extend(self.options.components.iter().map(|kind| (*kind, U256::ZERO)));
        } else {
            for kind in &self.options.components {
                let balance = self.fetcher.fetch(*kind, block_number, context).await?;
                components.push((*kind, balance));
            }
        }

        let own_balance = components
            .iter()
            .try_fold(U256::ZERO, |acc, (kind, balance)| {
                acc.checked_add(*balance).ok_or(SnapshotError::Overflow(*kind))
            })?;
        let user_balance =
            signed_difference(total, own_balance).ok_or(SnapshotError::Overflow(BalanceKind::Total))?;

        if user_balance.is_negative() {
            warn!(
                "Data integrity: operator balances {} exceed total {} on {} (block {})",
                own_balance, total, day, block_number
            );
        }

        info!(
            "{}: block {}, total {}, own {}, users {}",
            day, block_number, total, own_balance, user_balance
        );

        Ok(DailySnapshot {
            date: day,
            block_number,
            total,
            components,
            own_balance,
            user_balance,
        })
    }
}

/// `total - own` as a signed value; `None` if either side exceeds `I256::MAX`.
fn signed_difference(total: U256, own: U256) -> Option<I256> {
    let total = I256::try_from(total).ok()?;
    let own = I256::try_from(own).ok()?;
    total.checked_sub(own)
}

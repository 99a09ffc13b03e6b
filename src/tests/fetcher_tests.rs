#[cfg(test)]
mod tests {
    use alloy::primitives::{Address, U256};

    use crate::{
        blockchain::balances::{BalanceFetcher, FetchContext},
        error::SnapshotError,
        models::BalanceKind,
        tests::fakes::{
            allocated_call, hedger_call, liquidator_call, liquidators, memory_cache, sources,
            total_call, FakeChain,
        },
    };

    async fn fetcher(chain: &FakeChain, chunk_size: usize) -> BalanceFetcher<FakeChain> {
        BalanceFetcher::new(chain.clone(), memory_cache().await, sources(), chunk_size)
    }

    fn accounts(count: u8) -> Vec<Address> {
        (1..=count).map(Address::repeat_byte).collect()
    }

    #[tokio::test]
    async fn test_single_reads() {
        let chain = FakeChain::spaced(10, 0, 1);
        chain.set_balance(total_call(), 1_000);
        chain.set_balance(hedger_call(), 250);
        let fetcher = fetcher(&chain, 150).await;

        let total = fetcher.fetch(BalanceKind::Total, 5, FetchContext::default()).await.unwrap();
        let hedger = fetcher
            .fetch(BalanceKind::PartyBBalance, 5, FetchContext::default())
            .await
            .unwrap();

        assert_eq!(total, U256::from(1_000));
        assert_eq!(hedger, U256::from(250));
        assert_eq!(chain.read_calls(), 2);
        assert!(chain.batch_sizes().is_empty());
    }

    #[tokio::test]
    async fn test_allocated_balance_is_chunked() {
        let chain = FakeChain::spaced(10, 0, 1);
        let roster = accounts(5);
        for (i, account) in roster.iter().enumerate() {
            chain.set_balance(allocated_call(*account), 10 * (i as u64 + 1));
        }
        let fetcher = fetcher(&chain, 2).await;

        let sum = fetcher
            .fetch(BalanceKind::PartyBAllocated, 3, FetchContext::with_roster(&roster))
            .await
            .unwrap();

        assert_eq!(sum, U256::from(10 + 20 + 30 + 40 + 50));
        assert_eq!(chain.batch_sizes(), vec![2, 2, 1]);
    }

    #[tokio::test]
    async fn test_empty_roster_sums_to_zero() {
        let chain = FakeChain::spaced(10, 0, 1);
        let fetcher = fetcher(&chain, 2).await;

        let sum = fetcher
            .fetch(BalanceKind::PartyBAllocated, 3, FetchContext::with_roster(&[]))
            .await
            .unwrap();

        assert_eq!(sum, U256::ZERO);
        assert!(chain.batch_sizes().is_empty());
    }

    #[tokio::test]
    async fn test_liquidator_balances_are_summed() {
        let chain = FakeChain::spaced(10, 0, 1);
        for liquidator in liquidators() {
            chain.set_balance(liquidator_call(liquidator), 7);
        }
        let fetcher = fetcher(&chain, 150).await;

        let sum = fetcher
            .fetch(BalanceKind::LiquidatorAllocated, 1, FetchContext::default())
            .await
            .unwrap();

        assert_eq!(sum, U256::from(21));
        assert_eq!(chain.batch_sizes(), vec![3]);
    }

    #[tokio::test]
    async fn test_missing_roster_is_an_error() {
        let chain = FakeChain::spaced(10, 0, 1);
        let fetcher = fetcher(&chain, 150).await;

        let result = fetcher
            .fetch(BalanceKind::PartyBAllocated, 1, FetchContext::default())
            .await;

        assert!(matches!(
            result,
            Err(SnapshotError::MissingRoster(BalanceKind::PartyBAllocated))
        ));
    }

    #[tokio::test]
    async fn test_sum_overflow_is_an_error() {
        let chain = FakeChain::spaced(10, 0, 1);
        let roster = accounts(2);
        for account in &roster {
            chain.set_balance_u256(allocated_call(*account), U256::MAX);
        }
        let fetcher = fetcher(&chain, 150).await;

        let result = fetcher
            .fetch(BalanceKind::PartyBAllocated, 1, FetchContext::with_roster(&roster))
            .await;

        assert!(matches!(
            result,
            Err(SnapshotError::Overflow(BalanceKind::PartyBAllocated))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_fetches_share_one_read() {
        let chain = FakeChain::spaced(10, 0, 1);
        chain.set_balance(total_call(), 900);
        let roster = accounts(3);
        let fetcher = fetcher(&chain, 2).await;
        let context = FetchContext::with_roster(&roster);

        let (a, b, c) = tokio::join!(
            fetcher.fetch(BalanceKind::Total, 7, context),
            fetcher.fetch(BalanceKind::Total, 7, context),
            fetcher.fetch(BalanceKind::Total, 7, context),
        );
        assert_eq!(a.unwrap(), U256::from(900));
        assert_eq!(b.unwrap(), U256::from(900));
        assert_eq!(c.unwrap(), U256::from(900));
        assert_eq!(chain.read_calls(), 1);

        let (x, y) = tokio::join!(
            fetcher.fetch(BalanceKind::PartyBAllocated, 7, context),
            fetcher.fetch(BalanceKind::PartyBAllocated, 7, context),
        );
        assert_eq!(x.unwrap(), y.unwrap());
        assert_eq!(chain.batch_sizes(), vec![2, 1]);
    }

    #[tokio::test]
    async fn test_balances_are_cached_per_block() {
        let chain = FakeChain::spaced(10, 0, 1);
        chain.set_balance_at(total_call(), 4, 40);
        chain.set_balance_at(total_call(), 5, 50);
        let fetcher = fetcher(&chain, 150).await;

        let at_four = fetcher.fetch(BalanceKind::Total, 4, FetchContext::default()).await.unwrap();
        let again = fetcher.fetch(BalanceKind::Total, 4, FetchContext::default()).await.unwrap();
        let at_five = fetcher.fetch(BalanceKind::Total, 5, FetchContext::default()).await.unwrap();

        assert_eq!(at_four, U256::from(40));
        assert_eq!(again, at_four);
        assert_eq!(at_five, U256::from(50));
        assert_eq!(chain.read_calls(), 2, "Repeated (kind, block) should be served from cache");
    }
}

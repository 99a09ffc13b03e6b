#[cfg(test)]
mod tests {
    use crate::{
        blockchain::resolver::BlockResolver,
        cache::SnapshotCache,
        db::cache_entries,
        tests::fakes::{memory_cache, FakeChain},
    };

    async fn setup(chain: &FakeChain) -> (BlockResolver<FakeChain>, SnapshotCache) {
        let cache = memory_cache().await;
        (BlockResolver::new(chain.clone(), cache.clone()), cache)
    }

    #[tokio::test]
    async fn test_exact_timestamp_match() {
        let chain = FakeChain::spaced(1000, 0, 10);
        let (resolver, _) = setup(&chain).await;

        assert_eq!(resolver.resolve(1010).await.unwrap(), 101);
        assert_eq!(resolver.resolve(0).await.unwrap(), 0);
        assert_eq!(resolver.resolve(10_000).await.unwrap(), 1000);
    }

    #[tokio::test]
    async fn test_between_blocks_picks_nearest() {
        let chain = FakeChain::spaced(1000, 0, 10);
        let (resolver, _) = setup(&chain).await;

        assert_eq!(resolver.resolve(1012).await.unwrap(), 101);
        assert_eq!(resolver.resolve(1017).await.unwrap(), 102);
    }

    #[tokio::test]
    async fn test_tie_goes_to_earlier_block() {
        let chain = FakeChain::spaced(1000, 0, 10);
        let (resolver, _) = setup(&chain).await;

        // 1015 is 5s from both block 101 and block 102
        assert_eq!(resolver.resolve(1015).await.unwrap(), 101);
    }

    #[tokio::test]
    async fn test_before_genesis_resolves_to_zero() {
        let chain = FakeChain::spaced(100, 5_000, 12);
        let (resolver, _) = setup(&chain).await;

        assert_eq!(resolver.resolve(10).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_after_head_resolves_to_latest() {
        let chain = FakeChain::spaced(100, 5_000, 12);
        let (resolver, _) = setup(&chain).await;

        assert_eq!(resolver.resolve(1_000_000).await.unwrap(), 100);
    }

    #[tokio::test]
    async fn test_single_block_chain() {
        let chain = FakeChain::with_timestamps(vec![500]);
        let (resolver, _) = setup(&chain).await;

        assert_eq!(resolver.resolve(1).await.unwrap(), 0);
        assert_eq!(resolver.resolve(9_999).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_result_is_always_nearest() {
        // Irregular spacing with repeated timestamps
        let timestamps = vec![100, 100, 103, 110, 111, 111, 111, 140, 141, 200, 260, 261, 300];
        let chain = FakeChain::with_timestamps(timestamps.clone());
        let (resolver, _) = setup(&chain).await;

        for target in 50..350u64 {
            let block = resolver.resolve(target).await.unwrap();
            let best = timestamps.iter().map(|ts| ts.abs_diff(target)).min().unwrap();
            assert_eq!(
                chain.timestamp(block).abs_diff(target),
                best,
                "block {} is not nearest to {}",
                block,
                target
            );
        }
    }

    #[tokio::test]
    async fn test_resolution_is_cached() {
        let chain = FakeChain::spaced(1000, 0, 10);
        let (resolver, cache) = setup(&chain).await;

        let first = resolver.resolve(4_321).await.unwrap();
        let head_calls = chain.head_calls();
        let timestamp_calls = chain.timestamp_calls();
        assert!(timestamp_calls > 0);

        let second = resolver.resolve(4_321).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(chain.head_calls(), head_calls, "Second resolve should not hit the chain");
        assert_eq!(chain.timestamp_calls(), timestamp_calls);

        // A new process sharing the database answers from the durable store
        let restarted = SnapshotCache::new(cache.pool().clone(), 10);
        let resolver = BlockResolver::new(chain.clone(), restarted);
        assert_eq!(resolver.resolve(4_321).await.unwrap(), first);
        assert_eq!(chain.timestamp_calls(), timestamp_calls);
    }

    #[tokio::test]
    async fn test_concurrent_resolves_share_one_search() {
        let single = FakeChain::spaced(1000, 0, 10);
        let (resolver, _) = setup(&single).await;
        resolver.resolve(6_543).await.unwrap();

        let chain = FakeChain::spaced(1000, 0, 10);
        let (resolver, _) = setup(&chain).await;
        let (first, second) = tokio::join!(resolver.resolve(6_543), resolver.resolve(6_543));

        assert_eq!(first.unwrap(), second.unwrap());
        assert_eq!(chain.head_calls(), single.head_calls());
        assert_eq!(chain.timestamp_calls(), single.timestamp_calls());
    }

    #[tokio::test]
    async fn test_failed_lookup_is_not_cached() {
        let chain = FakeChain::spaced(1000, 0, 10);
        let (resolver, cache) = setup(&chain).await;

        chain.fail_next(1);
        assert!(resolver.resolve(2_000).await.is_err());
        assert_eq!(cache_entries::count_entries(cache.pool(), "block").await.unwrap(), 0);

        assert_eq!(resolver.resolve(2_000).await.unwrap(), 200);
        assert_eq!(cache_entries::count_entries(cache.pool(), "block").await.unwrap(), 1);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    use crate::{
        config::WatcherConfig,
        symbols::{active_symbols, new_listings, ExchangeInfo, SymbolWatcher},
        tests::fakes::watcher_config,
    };

    fn set(symbols: &[&str]) -> BTreeSet<String> {
        symbols.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_active_symbols_filters_status() {
        let info: ExchangeInfo = serde_json::from_str(
            r#"{
                "timezone": "UTC",
                "symbols": [
                    {"symbol": "BTCUSDT", "status": "TRADING", "pair": "BTCUSDT"},
                    {"symbol": "ETHUSDT", "status": "TRADING"},
                    {"symbol": "OLDUSDT", "status": "SETTLING"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(active_symbols(&info), set(&["BTCUSDT", "ETHUSDT"]));
    }

    #[test]
    fn test_new_listings() {
        let known = set(&["BTCUSDT", "ETHUSDT"]);
        let current = set(&["BTCUSDT", "SOLUSDT", "ETHUSDT", "NEWUSDT"]);

        assert_eq!(new_listings(&known, &current), set(&["NEWUSDT", "SOLUSDT"]));
        // Delistings are not reported
        assert!(new_listings(&current, &known).is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_watcher_stops() {
        let watcher = SymbolWatcher::new(&watcher_config()).unwrap();
        let (sender, mut receiver) = mpsc::channel(1);
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        tokio::time::timeout(Duration::from_secs(5), watcher.run(sender, shutdown))
            .await
            .expect("watcher should stop once cancelled");

        assert!(receiver.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_watcher_stops_when_cancelled_while_retrying() {
        // Nothing listens on the discard port, so every fetch fails
        let watcher = SymbolWatcher::new(&watcher_config()).unwrap();
        let (sender, _receiver) = mpsc::channel(1);
        let shutdown = CancellationToken::new();

        let cancel = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            cancel.cancel();
        });

        tokio::time::timeout(Duration::from_secs(10), watcher.run(sender, shutdown))
            .await
            .expect("watcher should stop once cancelled");
    }

    #[test]
    fn test_watcher_config_needs_no_balance_settings() {
        for name in ["RPC_URL", "SUBGRAPH_URL", "COLLATERAL_ADDRESS", "ADDRESS_TO_CHECK"] {
            std::env::remove_var(name);
        }

        let config = WatcherConfig::from_env().unwrap();
        assert!(config.poll_interval > Duration::ZERO);
        assert!(SymbolWatcher::new(&config).is_ok());
    }
}

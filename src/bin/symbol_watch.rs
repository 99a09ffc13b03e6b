// Polls the exchange listing endpoint and logs newly listed symbols until
// interrupted with Ctrl-C.

use balance_snapshot_service::{config::WatcherConfig, symbols::SymbolWatcher};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = WatcherConfig::from_env()?;
    let watcher = SymbolWatcher::new(&config)?;

    let shutdown = CancellationToken::new();
    let (sender, mut receiver) = mpsc::channel(16);

    let watch_shutdown = shutdown.clone();
    let handle = tokio::spawn(async move {
        watcher.run(sender, watch_shutdown).await;
    });

    loop {
        tokio::select! {
            listing = receiver.recv() => match listing {
                Some(symbols) => info!("Newly listed: {}", symbols.into_iter().collect::<Vec<_>>().join(", ")),
                None => break,
            },
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    error!("Failed to listen for Ctrl-C: {}", e);
                }
                info!("Interrupt received, stopping");
                shutdown.cancel();
            }
        }
    }

    let _ = handle.await;
    Ok(())
}

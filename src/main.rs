// Load configuration
// Set up logging
// Open the cache database
// Build the daily balance report and write it out

use balance_snapshot_service::{config::Config, service};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting balance-snapshot-service");

    let config = Config::from_env()?;
    tracing::info!(
        "Configuration loaded: {} to {}, report at {:?}",
        config.start_date,
        config.end_date,
        config.report_path
    );

    let state = service::init_state(config).await?;
    let snapshots = service::run_report(&state).await?;
    tracing::info!("Done: {} daily snapshots", snapshots.len());

    Ok(())
}

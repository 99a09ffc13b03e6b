//! Watches an exchange listing endpoint for newly listed trading symbols.
//!
//! Detection only: new listings are sent to a channel for whoever consumes
//! them. The loop stops when the cancellation token fires or the receiver is
//! dropped.

use backon::{BackoffBuilder, ExponentialBackoff, ExponentialBuilder};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::WatcherConfig;

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Failed to fetch exchange info: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
pub struct ExchangeInfo {
    pub symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Deserialize)]
pub struct SymbolInfo {
    pub symbol: String,
    pub status: String,
}

pub fn active_symbols(info: &ExchangeInfo) -> BTreeSet<String> {
    info.symbols
        .iter()
        .filter(|s| s.status == "TRADING")
        .map(|s| s.symbol.clone())
        .collect()
}

pub fn new_listings(known: &BTreeSet<String>, current: &BTreeSet<String>) -> BTreeSet<String> {
    current.difference(known).cloned().collect()
}

pub struct SymbolWatcher {
    http: reqwest::Client,
    url: String,
    poll_interval: Duration,
    max_backoff: Duration,
}

impl SymbolWatcher {
    pub fn new(config: &WatcherConfig) -> Result<Self, WatchError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http,
            url: config.exchange_info_url.clone(),
            poll_interval: config.poll_interval,
            max_backoff: config.poll_interval * 16,
        })
    }

    pub async fn fetch_active_symbols(&self) -> Result<BTreeSet<String>, WatchError> {
        let info: ExchangeInfo = self
            .http
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(active_symbols(&info))
    }

    /// Polls until `shutdown` is cancelled. Consecutive failures back off
    /// exponentially from the poll interval; a success resets the delay.
    pub async fn run(&self, listings: mpsc::Sender<BTreeSet<String>>, shutdown: CancellationToken) {
        info!("Starting symbol watcher against {}", self.url);

        let initial = tokio::select! {
            biased;
            _ = shutdown.cancelled() => None,
            symbols = self.initial_symbols(&shutdown) => symbols,
        };
        let Some(mut known) = initial else {
            info!("Symbol watcher cancelled before start");
            return;
        };
        info!("Monitoring started. Found {} symbols initially.", known.len());

        let mut backoff = self.backoff();
        let mut delay = self.poll_interval;

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!("Shutting down symbol watcher");
                    break;
                }
                _ = sleep(delay) => {}
            }

            match self.fetch_active_symbols().await {
                Ok(current) => {
                    backoff = self.backoff();
                    delay = self.poll_interval;

                    let added = new_listings(&known, &current);
                    if added.is_empty() {
                        debug!("No new symbols ({} active)", current.len());
                        continue;
                    }

                    info!("New symbols detected: {:?}", added);
                    known = current;
                    if listings.send(added).await.is_err() {
                        warn!("Listing receiver dropped, stopping symbol watcher");
                        break;
                    }
                }
                Err(e) => {
                    delay = backoff.next().unwrap_or(self.max_backoff);
                    warn!("Error fetching symbols: {}. Retrying in {:?}", e, delay);
                }
            }
        }
    }

    async fn initial_symbols(&self, shutdown: &CancellationToken) -> Option<BTreeSet<String>> {
        let mut backoff = self.backoff();

        loop {
            match self.fetch_active_symbols().await {
                Ok(symbols) => return Some(symbols),
                Err(e) => {
                    let delay = backoff.next().unwrap_or(self.max_backoff);
                    warn!("Initial symbol fetch failed: {}. Retrying in {:?}", e, delay);
                    tokio::select! {
                        _ = shutdown.cancelled() => return None,
                        _ = sleep(delay) => {}
                    }
                }
            }
        }
    }

    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBuilder::default()
            .with_min_delay(self.poll_interval)
            .with_max_delay(self.max_backoff)
            .without_max_times()
            .build()
    }
}

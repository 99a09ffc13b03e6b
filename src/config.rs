// Configuration for the snapshot service, read from the environment:
// - RPC endpoint, contract and operator addresses
// - Subgraph endpoint used to enumerate accounts
// - Cache database and in-memory front sizing
// - Report range, output path and failure policy
// - Symbol watcher endpoint and polling interval

use alloy::primitives::Address;
use chrono::{NaiveDate, Utc};
use dotenv::dotenv;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::validation::{parse_address_list, parse_date, validate_evm_address, ValidationError};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error("{name} must be greater than zero")]
    Zero { name: &'static str },

    #[error("Empty day range: start {start} is not before end {end}")]
    EmptyDayRange { start: NaiveDate, end: NaiveDate },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// What the aggregator does with a day whose reads keep failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop the whole run with the day's error.
    #[default]
    Abort,
    /// Log the error and leave the day out of the report.
    SkipDay,
}

impl FromStr for FailurePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "skip" | "skip_day" => Ok(Self::SkipDay),
            other => Err(ConfigError::Invalid {
                name: "FAILURE_POLICY",
                reason: format!("expected 'abort' or 'skip', got '{}'", other),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub rpc_url: String,
    pub subgraph_url: String,
    pub collateral_address: Address,
    pub symmio_address: Address,
    pub hedger_address: Address,
    pub liquidator_addresses: Vec<Address>,
    pub address_to_check: Address,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub rpc_timeout_secs: u64,
    pub rpc_rate_limit: Option<u32>,
    pub multicall_chunk_size: usize,
    pub roster_page_size: usize,
    pub unit_decimals: u8,
    pub cache_max_capacity: u64,
    pub day_concurrency: usize,
    pub day_retries: usize,
    pub failure_policy: FailurePolicy,
    pub report_path: PathBuf,
    pub legacy_block_cache: Option<PathBuf>,
    pub legacy_balance_cache: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:balance_cache.db".to_string());
        let rpc_url = required("RPC_URL")?;
        let subgraph_url = required("SUBGRAPH_URL")?;
        let collateral_address = validate_evm_address(&required("COLLATERAL_ADDRESS")?)?;
        let symmio_address = validate_evm_address(&required("SYMMIO_ADDRESS")?)?;
        let hedger_address = validate_evm_address(&required("HEDGER_ADDRESS")?)?;
        let address_to_check = validate_evm_address(&required("ADDRESS_TO_CHECK")?)?;
        let liquidator_addresses = match env::var("LIQUIDATOR_ADDRESSES") {
            Ok(list) => parse_address_list(&list)?,
            Err(_) => Vec::new(),
        };
        let start_date = match env::var("START_DATE") {
            Ok(raw) => parse_date(&raw)?,
            Err(_) => NaiveDate::from_ymd_opt(2024, 4, 2).ok_or(ConfigError::Invalid {
                name: "START_DATE",
                reason: "default start date out of range".to_string(),
            })?,
        };
        let end_date = match env::var("END_DATE") {
            Ok(raw) => parse_date(&raw)?,
            Err(_) => Utc::now().date_naive(),
        };
        let rpc_timeout_secs = parsed_or("RPC_TIMEOUT_SECS", 30)?;
        let rpc_rate_limit = parsed_opt("RPC_RATE_LIMIT")?;
        let multicall_chunk_size = parsed_or("MULTICALL_CHUNK_SIZE", 150)?;
        let roster_page_size = parsed_or("ROSTER_PAGE_SIZE", 1000)?;
        let unit_decimals = parsed_or("UNIT_DECIMALS", 18)?;
        let cache_max_capacity = parsed_or("CACHE_MAX_CAPACITY", 100_000)?;
        let day_concurrency = parsed_or("DAY_CONCURRENCY", 1)?;
        let day_retries = parsed_or("DAY_RETRIES", 0)?;
        let failure_policy = match env::var("FAILURE_POLICY") {
            Ok(raw) => raw.parse()?,
            Err(_) => FailurePolicy::default(),
        };
        let report_path = env::var("REPORT_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("Balances.csv"));
        let legacy_block_cache = env::var("LEGACY_BLOCK_CACHE").ok().map(PathBuf::from);
        let legacy_balance_cache = env::var("LEGACY_BALANCE_CACHE").ok().map(PathBuf::from);

        let config = Self {
            database_url,
            rpc_url,
            subgraph_url,
            collateral_address,
            symmio_address,
            hedger_address,
            liquidator_addresses,
            address_to_check,
            start_date,
            end_date,
            rpc_timeout_secs,
            rpc_rate_limit,
            multicall_chunk_size,
            roster_page_size,
            unit_decimals,
            cache_max_capacity,
            day_concurrency,
            day_retries,
            failure_policy,
            report_path,
            legacy_block_cache,
            legacy_balance_cache,
        };
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings that would make the run loop forever or do nothing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.multicall_chunk_size == 0 {
            return Err(ConfigError::Zero { name: "MULTICALL_CHUNK_SIZE" });
        }
        if self.roster_page_size == 0 {
            return Err(ConfigError::Zero { name: "ROSTER_PAGE_SIZE" });
        }
        if self.rpc_timeout_secs == 0 {
            return Err(ConfigError::Zero { name: "RPC_TIMEOUT_SECS" });
        }
        if self.day_concurrency == 0 {
            return Err(ConfigError::Zero { name: "DAY_CONCURRENCY" });
        }
        if self.start_date >= self.end_date {
            return Err(ConfigError::EmptyDayRange {
                start: self.start_date,
                end: self.end_date,
            });
        }
        Ok(())
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout_secs)
    }
}

/// Settings of the symbol watcher, which needs none of the balance settings.
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    pub exchange_info_url: String,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
}

impl WatcherConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        let exchange_info_url = env::var("EXCHANGE_INFO_URL")
            .unwrap_or_else(|_| "https://fapi.binance.com/fapi/v1/exchangeInfo".to_string());
        let poll_interval_secs: u64 = parsed_or("POLL_INTERVAL_SECS", 60)?;
        let timeout_secs: u64 = parsed_or("RPC_TIMEOUT_SECS", 30)?;

        if poll_interval_secs == 0 {
            return Err(ConfigError::Zero { name: "POLL_INTERVAL_SECS" });
        }
        if timeout_secs == 0 {
            return Err(ConfigError::Zero { name: "RPC_TIMEOUT_SECS" });
        }

        Ok(Self {
            exchange_info_url,
            poll_interval: Duration::from_secs(poll_interval_secs),
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(name))
}

pub(crate) fn parsed_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    Ok(parsed_opt(name)?.unwrap_or(default))
}

/// Parses an optional variable; set but unparseable is an error.
pub(crate) fn parsed_opt<T: FromStr>(name: &'static str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::Invalid {
                name,
                reason: e.to_string(),
            }),
        Err(_) => Ok(None),
    }
}

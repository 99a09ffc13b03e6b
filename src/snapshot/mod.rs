pub mod aggregator;
pub mod report;
pub mod units;

use chrono::{NaiveDate, NaiveTime};

use crate::config::ConfigError;

pub use aggregator::{AggregatorOptions, SnapshotAggregator};

/// Every date from `start` (inclusive) to `end` (exclusive).
pub fn day_range(start: NaiveDate, end: NaiveDate) -> Result<Vec<NaiveDate>, ConfigError> {
    if start >= end {
        return Err(ConfigError::EmptyDayRange { start, end });
    }

    Ok(start.iter_days().take_while(|day| *day < end).collect())
}

/// Unix timestamp of midnight UTC at the start of `day`. Days before the
/// epoch map to 0.
pub fn day_timestamp(day: NaiveDate) -> u64 {
    let seconds = day.and_time(NaiveTime::MIN).and_utc().timestamp();
    u64::try_from(seconds).unwrap_or(0)
}

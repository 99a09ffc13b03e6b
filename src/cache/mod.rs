//! Durable memo of historical chain facts.
//!
//! Entries describe finalized chain state (the block nearest a past timestamp,
//! a balance at a past block), so they are written once and never expire.

pub mod keys;
pub mod legacy;
pub mod snapshot;

use alloy::primitives::U256;
use std::path::PathBuf;
use thiserror::Error;

pub use keys::CacheKey;
pub use snapshot::SnapshotCache;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Corrupt cache entry {key}: {value:?}")]
    Corrupt { key: CacheKey, value: String },

    #[error("Concurrent initialisation of a cache entry failed: {0}")]
    Coalesced(String),

    #[error("Failed to read legacy cache file {0:?}: {1}")]
    LegacyRead(PathBuf, std::io::Error),

    #[error("Failed to parse legacy cache file {0:?}: {1}")]
    LegacyParse(PathBuf, serde_json::Error),
}

/// A value that can be stored in the string-valued cache.
pub trait CacheValue: Sized {
    fn encode(&self) -> String;
    fn decode(raw: &str) -> Option<Self>;
}

impl CacheValue for u64 {
    fn encode(&self) -> String {
        self.to_string()
    }

    fn decode(raw: &str) -> Option<Self> {
        raw.trim().parse().ok()
    }
}

impl CacheValue for U256 {
    fn encode(&self) -> String {
        self.to_string()
    }

    fn decode(raw: &str) -> Option<Self> {
        U256::from_str_radix(raw.trim(), 10).ok()
    }
}

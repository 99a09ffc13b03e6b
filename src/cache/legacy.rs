//! Import of the flat JSON cache files written by the previous tooling.
//!
//! Block file: `{"<timestamp>": <block>}`.
//! Balance file: `{"USDE_<owner>_<block>": <int>, "hedger_<block>": "<int>",
//! "hedger_allocated_<block>": "<int>", "liquidators_<block>": "<int>"}`.
//! Unrecognised keys are skipped.

use alloy::primitives::{Address, U256};
use serde_json::value::RawValue;
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

use super::{CacheError, CacheKey, CacheValue};
use crate::db::cache_entries;
use crate::models::BalanceKind;

pub async fn import_legacy_block_cache(
    pool: &sqlx::SqlitePool,
    path: &Path,
) -> Result<usize, CacheError> {
    let Some(entries) = read_json_map(path)? else {
        return Ok(0);
    };

    let mut rows = Vec::with_capacity(entries.len());
    for (key, value) in entries {
        let block = json_integer(&value).and_then(|raw| u64::decode(&raw));
        let (Ok(timestamp), Some(block)) = (key.parse::<u64>(), block) else {
            warn!("Skipping unrecognised legacy block entry {}: {}", key, value.get());
            continue;
        };
        rows.push((CacheKey::resolved_block(timestamp), block.encode()));
    }

    let inserted = cache_entries::insert_entries(pool, &rows).await?;
    info!("Imported {} of {} legacy block entries from {:?}", inserted, rows.len(), path);
    Ok(inserted)
}

/// `total_owner` is the address whose collateral balance is the `Total`
/// component; `USDE_` entries for any other address are ignored.
pub async fn import_legacy_balance_cache(
    pool: &sqlx::SqlitePool,
    path: &Path,
    total_owner: Address,
) -> Result<usize, CacheError> {
    let Some(entries) = read_json_map(path)? else {
        return Ok(0);
    };

    let mut rows = Vec::with_capacity(entries.len());
    for (key, value) in entries {
        let balance = json_integer(&value).and_then(|raw| U256::decode(&raw));
        let (Some(cache_key), Some(balance)) = (legacy_balance_key(&key, total_owner), balance)
        else {
            warn!("Skipping unrecognised legacy balance entry {}", key);
            continue;
        };
        rows.push((cache_key, balance.encode()));
    }

    let inserted = cache_entries::insert_entries(pool, &rows).await?;
    info!("Imported {} of {} legacy balance entries from {:?}", inserted, rows.len(), path);
    Ok(inserted)
}

/// Maps a legacy balance key onto a structured key.
pub fn legacy_balance_key(key: &str, total_owner: Address) -> Option<CacheKey> {
    let (prefix, block) = key.rsplit_once('_')?;
    let block = block.parse::<u64>().ok()?;

    let kind = match prefix {
        "hedger" => BalanceKind::PartyBBalance,
        "hedger_allocated" => BalanceKind::PartyBAllocated,
        "liquidators" => BalanceKind::LiquidatorAllocated,
        other => {
            let owner = other.strip_prefix("USDE_")?.parse::<Address>().ok()?;
            if owner != total_owner {
                return None;
            }
            BalanceKind::Total
        }
    };

    Some(CacheKey::balance(kind, block))
}

fn read_json_map(path: &Path) -> Result<Option<HashMap<String, Box<RawValue>>>, CacheError> {
    if !path.exists() {
        warn!("Legacy cache file {:?} not found, nothing to import", path);
        return Ok(None);
    }

    let content =
        std::fs::read_to_string(path).map_err(|e| CacheError::LegacyRead(path.to_path_buf(), e))?;
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| CacheError::LegacyParse(path.to_path_buf(), e))
}

/// Digits of an integer written either as a bare JSON number or as a string.
/// Bare numbers are taken verbatim so balances wider than 64 bits survive.
fn json_integer(value: &RawValue) -> Option<String> {
    let text = value.get().trim();
    if text.starts_with('"') {
        serde_json::from_str::<String>(text).ok()
    } else {
        Some(text.to_string())
    }
}

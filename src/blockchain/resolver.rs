//! Timestamp to block resolution.
//!
//! Binary search over `[0, latest]` relying on block timestamps being
//! non-decreasing. A chain that violates this can make the search settle on a
//! block that is not the nearest one; that is not detected.

use std::cmp::Ordering;
use tracing::{debug, info};

use super::reader::BlockReader;
use crate::cache::{CacheKey, SnapshotCache};
use crate::error::SnapshotError;

pub struct BlockResolver<R> {
    reader: R,
    cache: SnapshotCache,
}

impl<R: BlockReader> BlockResolver<R> {
    pub fn new(reader: R, cache: SnapshotCache) -> Self {
        Self { reader, cache }
    }

    /// Block whose timestamp is nearest to `target` (Unix seconds).
    ///
    /// The answer is memoized permanently. Lookup failures abort the call and
    /// leave nothing in the cache.
    pub async fn resolve(&self, target: u64) -> Result<u64, SnapshotError> {
        self.cache
            .get_or_try_insert_with(CacheKey::resolved_block(target), async {
                let block = self.search(target).await?;
                info!("Nearest block to {} is {}", target, block);
                Ok::<_, SnapshotError>(block)
            })
            .await
    }

    async fn search(&self, target: u64) -> Result<u64, SnapshotError> {
        let latest = self.reader.latest_block_number().await?;

        let mut lower = 0u64;
        // None once the search has run below block 0
        let mut upper = Some(latest);

        while let Some(hi) = upper {
            if lower > hi {
                break;
            }
            let mid = lower + (hi - lower) / 2;
            let mid_timestamp = self.reader.block_timestamp(mid).await?;

            match mid_timestamp.cmp(&target) {
                Ordering::Less => lower = mid + 1,
                Ordering::Greater => upper = mid.checked_sub(1),
                Ordering::Equal => {
                    debug!("Exact timestamp match at block {}", mid);
                    return Ok(mid);
                }
            }
        }

        let Some(upper) = upper else {
            debug!("Target {} precedes genesis", target);
            return Ok(0);
        };
        if lower > latest {
            debug!("Target {} is past the chain head {}", target, latest);
            return Ok(latest);
        }

        let lower_distance = self.reader.block_timestamp(lower).await?.abs_diff(target);
        let upper_distance = self.reader.block_timestamp(upper).await?.abs_diff(target);

        // Strict comparison: an equal distance keeps `upper`
        if lower_distance < upper_distance {
            Ok(lower)
        } else {
            Ok(upper)
        }
    }
}

//! Read-through cache: moka in memory, SQLite underneath

use moka::future::Cache;
use sqlx::SqlitePool;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

use super::keys::CacheKey;
use super::{CacheError, CacheValue};
use crate::db::cache_entries;

/// Manages resolved-block and balance entries for a run.
///
/// The in-memory front may drop entries under capacity pressure; the durable
/// store never does.
#[derive(Clone)]
pub struct SnapshotCache {
    memory: Cache<CacheKey, String>,
    pool: SqlitePool,
}

impl SnapshotCache {
    pub fn new(pool: SqlitePool, capacity: u64) -> Self {
        let memory = Cache::builder().max_capacity(capacity).build();

        Self { memory, pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Get a cached value, checking memory first and the durable store second
    pub async fn get<T: CacheValue>(&self, key: &CacheKey) -> Result<Option<T>, CacheError> {
        let raw = match self.memory.get(key).await {
            Some(raw) => Some(raw),
            None => {
                let stored = cache_entries::get_entry(&self.pool, key).await?;
                if let Some(raw) = &stored {
                    self.memory.insert(*key, raw.clone()).await;
                }
                stored
            }
        };

        match raw {
            Some(raw) => decode(key, raw).map(Some),
            None => Ok(None),
        }
    }

    /// Persist a value. Returns once the row is committed. An existing entry
    /// is kept, and the memory front is loaded with it.
    pub async fn set<T: CacheValue>(&self, key: &CacheKey, value: &T) -> Result<(), CacheError> {
        let mut raw = value.encode();
        if !cache_entries::insert_entry(&self.pool, key, &raw).await? {
            debug!("Cache entry already present, keeping the stored value: {}", key);
            match cache_entries::get_entry(&self.pool, key).await? {
                Some(stored) => raw = stored,
                None => return Ok(()),
            }
        }
        self.memory.insert(*key, raw).await;
        Ok(())
    }

    /// Returns the cached value for `key`, or runs `init`, persists its result
    /// and returns it. Failures of `init` are never stored. Concurrent callers
    /// for the same key share a single `init` run.
    pub async fn get_or_try_insert_with<T, E, F>(&self, key: CacheKey, init: F) -> Result<T, E>
    where
        T: CacheValue,
        E: From<CacheError> + Display + Send + Sync + 'static,
        F: Future<Output = Result<T, E>>,
    {
        if let Some(raw) = self.memory.get(&key).await {
            debug!("Cache hit for key: {}", key);
            return Ok(decode(&key, raw)?);
        }

        let pool = &self.pool;
        let load = async move {
            if let Some(raw) = cache_entries::get_entry(pool, &key)
                .await
                .map_err(CacheError::from)?
            {
                debug!("Durable cache hit for key: {}", key);
                return Ok::<String, E>(raw);
            }

            debug!("Cache miss for key: {}", key);
            let raw = init.await?.encode();
            cache_entries::insert_entry(pool, &key, &raw)
                .await
                .map_err(CacheError::from)?;
            Ok::<String, E>(raw)
        };

        let raw = self
            .memory
            .try_get_with(key, load)
            .await
            .map_err(|shared: Arc<E>| {
                Arc::try_unwrap(shared)
                    .unwrap_or_else(|shared| E::from(CacheError::Coalesced(shared.to_string())))
            })?;

        Ok(decode(&key, raw)?)
    }
}

fn decode<T: CacheValue>(key: &CacheKey, raw: String) -> Result<T, CacheError> {
    T::decode(&raw).ok_or(CacheError::Corrupt {
        key: *key,
        value: raw,
    })
}

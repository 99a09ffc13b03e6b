use sqlx::{Pool, Row, Sqlite};

use crate::cache::CacheKey;

pub async fn get_entry(pool: &Pool<Sqlite>, key: &CacheKey) -> Result<Option<String>, sqlx::Error> {
    let row = sqlx::query("SELECT value FROM cache_entries WHERE namespace = ? AND key = ?")
        .bind(key.namespace())
        .bind(key.key())
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|row| row.get::<String, _>("value")))
}

/// Inserts an entry unless one already exists. Returns whether a row was written.
pub async fn insert_entry(pool: &Pool<Sqlite>, key: &CacheKey, value: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO cache_entries (namespace, key, value) VALUES (?, ?, ?)
         ON CONFLICT(namespace, key) DO NOTHING",
    )
    .bind(key.namespace())
    .bind(key.key())
    .bind(value)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Inserts many entries in one transaction, skipping existing keys.
pub async fn insert_entries(
    pool: &Pool<Sqlite>,
    entries: &[(CacheKey, String)],
) -> Result<usize, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut inserted = 0;

    for (key, value) in entries {
        let result = sqlx::query(
            "INSERT INTO cache_entries (namespace, key, value) VALUES (?, ?, ?)
             ON CONFLICT(namespace, key) DO NOTHING",
        )
        .bind(key.namespace())
        .bind(key.key())
        .bind(value)
        .execute(&mut *tx)
        .await?;
        inserted += result.rows_affected() as usize;
    }

    tx.commit().await?;

    Ok(inserted)
}

pub async fn count_entries(pool: &Pool<Sqlite>, namespace: &str) -> Result<i64, sqlx::Error> {
    let count = sqlx::query("SELECT COUNT(*) FROM cache_entries WHERE namespace = ?")
        .bind(namespace)
        .fetch_one(pool)
        .await?
        .get::<i64, _>(0);

    Ok(count)
}

pub mod cache_entries;
pub mod connection;
pub mod migration;

pub const INIT_SCHEMA: &str = r#"
-- Write-once memo of historical chain facts
CREATE TABLE IF NOT EXISTS cache_entries (
    namespace TEXT NOT NULL,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    created_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
    PRIMARY KEY (namespace, key)
);
"#;

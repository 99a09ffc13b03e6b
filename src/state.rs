use crate::cache::SnapshotCache;
use crate::config::Config;
use sqlx::SqlitePool;

pub struct AppState {
    pub config: Config,
    pub db_pool: SqlitePool,
    pub cache: SnapshotCache,
}

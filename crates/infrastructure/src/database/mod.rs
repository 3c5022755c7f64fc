//! 事件存储的数据库实现
//!
//! 按URL自动选择PostgreSQL或SQLite连接池，两种后端实现同一个
//! `EventRepository` 抽象。

mod postgres;
mod sqlite;

pub use postgres::PostgresEventRepository;
pub use sqlite::SqliteEventRepository;

use std::sync::Arc;

use event_scheduler_core::{DatabaseConfig, SchedulerError, SchedulerResult, StoreConfig};
use event_scheduler_domain::repositories::EventRepository;

/// Database type detection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseType {
    PostgreSQL,
    SQLite,
}

impl DatabaseType {
    pub fn from_url(url: &str) -> Self {
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            DatabaseType::PostgreSQL
        } else {
            DatabaseType::SQLite
        }
    }
}

/// Database connection pool enum
pub enum DatabasePool {
    PostgreSQL(sqlx::PgPool),
    SQLite(sqlx::SqlitePool),
}

impl DatabasePool {
    /// Create pool from config with automatic type detection
    pub async fn connect(config: &DatabaseConfig) -> SchedulerResult<Self> {
        match DatabaseType::from_url(&config.url) {
            DatabaseType::PostgreSQL => {
                let pool = sqlx::postgres::PgPoolOptions::new()
                    .max_connections(config.max_connections)
                    .min_connections(config.min_connections)
                    .acquire_timeout(std::time::Duration::from_secs(
                        config.connection_timeout_seconds,
                    ))
                    .idle_timeout(std::time::Duration::from_secs(config.idle_timeout_seconds))
                    .connect(&config.url)
                    .await
                    .map_err(SchedulerError::Database)?;
                Ok(DatabasePool::PostgreSQL(pool))
            }
            DatabaseType::SQLite => {
                let pool = sqlx::sqlite::SqlitePoolOptions::new()
                    .max_connections(config.max_connections)
                    .connect(&config.url)
                    .await
                    .map_err(SchedulerError::Database)?;
                Ok(DatabasePool::SQLite(pool))
            }
        }
    }

    pub fn database_type(&self) -> DatabaseType {
        match self {
            DatabasePool::PostgreSQL(_) => DatabaseType::PostgreSQL,
            DatabasePool::SQLite(_) => DatabaseType::SQLite,
        }
    }

    /// 初始化事件表和 (status, date) 二级索引
    ///
    /// index_name 来自配置，已在配置校验阶段限定为合法标识符。
    pub async fn initialize_schema(&self, index_name: &str) -> SchedulerResult<()> {
        match self {
            DatabasePool::PostgreSQL(pool) => {
                sqlx::query(
                    r#"
                    CREATE TABLE IF NOT EXISTS events (
                        id UUID PRIMARY KEY,
                        date TIMESTAMPTZ NOT NULL,
                        payload TEXT NOT NULL,
                        target TEXT NOT NULL,
                        status VARCHAR(16) NOT NULL,
                        user_name TEXT,
                        failure_topic TEXT,
                        created_at TIMESTAMPTZ NOT NULL
                    )
                    "#,
                )
                .execute(pool)
                .await?;

                sqlx::query(&format!(
                    "CREATE INDEX IF NOT EXISTS {index_name} ON events (status, date)"
                ))
                .execute(pool)
                .await?;
            }
            DatabasePool::SQLite(pool) => {
                // SQLite侧日期与创建时间存为epoch微秒，保证游标比较为数值比较
                sqlx::query(
                    r#"
                    CREATE TABLE IF NOT EXISTS events (
                        id TEXT PRIMARY KEY,
                        date INTEGER NOT NULL,
                        payload TEXT NOT NULL,
                        target TEXT NOT NULL,
                        status TEXT NOT NULL,
                        user_name TEXT,
                        failure_topic TEXT,
                        created_at INTEGER NOT NULL
                    )
                    "#,
                )
                .execute(pool)
                .await?;

                sqlx::query(&format!(
                    "CREATE INDEX IF NOT EXISTS {index_name} ON events (status, date)"
                ))
                .execute(pool)
                .await?;
            }
        }

        Ok(())
    }

    pub async fn health_check(&self) -> SchedulerResult<()> {
        match self {
            DatabasePool::PostgreSQL(pool) => {
                sqlx::query("SELECT 1").execute(pool).await?;
            }
            DatabasePool::SQLite(pool) => {
                sqlx::query("SELECT 1").execute(pool).await?;
            }
        }
        Ok(())
    }

    pub async fn close(&self) {
        match self {
            DatabasePool::PostgreSQL(pool) => pool.close().await,
            DatabasePool::SQLite(pool) => pool.close().await,
        }
    }

    /// 按连接池类型创建事件仓储
    pub fn create_event_repository(&self, store: &StoreConfig) -> Arc<dyn EventRepository> {
        match self {
            DatabasePool::PostgreSQL(pool) => Arc::new(PostgresEventRepository::new(pool.clone())),
            DatabasePool::SQLite(pool) => Arc::new(SqliteEventRepository::new(
                pool.clone(),
                store.index_name.clone(),
            )),
        }
    }
}

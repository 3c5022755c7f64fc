use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use tracing::{debug, instrument};
use uuid::Uuid;

use event_scheduler_core::{SchedulerError, SchedulerResult};
use event_scheduler_domain::entities::{EventRecord, EventStatus};
use event_scheduler_domain::repositories::{EventCursor, EventPage, EventRepository};

/// SQLite事件仓储，适用于嵌入式部署场景
///
/// 日期存为epoch微秒；到期查询通过 INDEXED BY 强制使用配置中指定的
/// (status, date) 二级索引。
pub struct SqliteEventRepository {
    pool: SqlitePool,
    index_name: String,
}

impl SqliteEventRepository {
    pub fn new(pool: SqlitePool, index_name: String) -> Self {
        Self { pool, index_name }
    }

    fn micros_to_datetime(micros: i64) -> SchedulerResult<DateTime<Utc>> {
        DateTime::from_timestamp_micros(micros)
            .ok_or_else(|| SchedulerError::Internal(format!("无效的时间戳微秒值: {micros}")))
    }

    fn row_to_event(row: &sqlx::sqlite::SqliteRow) -> SchedulerResult<EventRecord> {
        let id_raw: String = row.try_get("id")?;
        let id = Uuid::parse_str(&id_raw)
            .map_err(|e| SchedulerError::DatabaseOperation(format!("无效的事件id: {e}")))?;

        Ok(EventRecord {
            id,
            date: Self::micros_to_datetime(row.try_get("date")?)?,
            payload: row.try_get("payload")?,
            target: row.try_get("target")?,
            status: row.try_get("status")?,
            user: row.try_get("user_name")?,
            failure_topic: row.try_get("failure_topic")?,
            created_at: Self::micros_to_datetime(row.try_get("created_at")?)?,
        })
    }
}

#[async_trait]
impl EventRepository for SqliteEventRepository {
    #[instrument(skip(self, events), fields(batch_size = events.len()))]
    async fn insert_batch(&self, events: &[EventRecord]) -> SchedulerResult<()> {
        if events.is_empty() {
            return Ok(());
        }

        // 整批在同一事务中提交
        let mut tx = self.pool.begin().await?;
        for event in events {
            sqlx::query(
                r#"
                INSERT INTO events (id, date, payload, target, status, user_name, failure_topic, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(event.id.to_string())
            .bind(event.date.timestamp_micros())
            .bind(&event.payload)
            .bind(&event.target)
            .bind(event.status)
            .bind(&event.user)
            .bind(&event.failure_topic)
            .bind(event.created_at.timestamp_micros())
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        debug!("已持久化 {} 条事件记录", events.len());
        Ok(())
    }

    #[instrument(skip(self), fields(status = status.as_str(), limit = limit))]
    async fn find_due(
        &self,
        status: EventStatus,
        due_before: DateTime<Utc>,
        limit: i64,
        cursor: Option<EventCursor>,
    ) -> SchedulerResult<EventPage> {
        let due_before_micros = due_before.timestamp_micros();

        let rows = match cursor {
            None => {
                let sql = format!(
                    "SELECT id, date FROM events INDEXED BY {} \
                     WHERE status = ? AND date < ? \
                     ORDER BY date, id LIMIT ?",
                    self.index_name
                );
                sqlx::query(&sql)
                    .bind(status)
                    .bind(due_before_micros)
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await?
            }
            Some(cursor) => {
                let cursor_micros = cursor.date.timestamp_micros();
                let sql = format!(
                    "SELECT id, date FROM events INDEXED BY {} \
                     WHERE status = ? AND date < ? \
                       AND (date > ? OR (date = ? AND id > ?)) \
                     ORDER BY date, id LIMIT ?",
                    self.index_name
                );
                sqlx::query(&sql)
                    .bind(status)
                    .bind(due_before_micros)
                    .bind(cursor_micros)
                    .bind(cursor_micros)
                    .bind(cursor.id.to_string())
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        let mut ids = Vec::with_capacity(rows.len());
        let mut last_key: Option<EventCursor> = None;
        for row in &rows {
            let id_raw: String = row.try_get("id")?;
            let id = Uuid::parse_str(&id_raw)
                .map_err(|e| SchedulerError::DatabaseOperation(format!("无效的事件id: {e}")))?;
            let date = Self::micros_to_datetime(row.try_get("date")?)?;
            ids.push(id);
            last_key = Some(EventCursor { date, id });
        }

        // 短页即最后一页，满页才携带游标
        let next_cursor = if rows.len() as i64 == limit {
            last_key
        } else {
            None
        };

        debug!("到期事件查询返回 {} 条", ids.len());
        Ok(EventPage { ids, next_cursor })
    }

    async fn get_by_id(&self, id: Uuid) -> SchedulerResult<Option<EventRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, date, payload, target, status, user_name, failure_topic, created_at
            FROM events WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(Self::row_to_event(&row)?)),
            None => Ok(None),
        }
    }
}

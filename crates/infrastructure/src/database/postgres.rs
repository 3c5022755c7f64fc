use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::{debug, instrument};
use uuid::Uuid;

use event_scheduler_core::SchedulerResult;
use event_scheduler_domain::entities::{EventRecord, EventStatus};
use event_scheduler_domain::repositories::{EventCursor, EventPage, EventRepository};

pub struct PostgresEventRepository {
    pool: PgPool,
}

impl PostgresEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_event(row: &sqlx::postgres::PgRow) -> SchedulerResult<EventRecord> {
        Ok(EventRecord {
            id: row.try_get("id")?,
            date: row.try_get("date")?,
            payload: row.try_get("payload")?,
            target: row.try_get("target")?,
            status: row.try_get("status")?,
            user: row.try_get("user_name")?,
            failure_topic: row.try_get("failure_topic")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl EventRepository for PostgresEventRepository {
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
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(event.id)
            .bind(event.date)
            .bind(&event.payload)
            .bind(&event.target)
            .bind(event.status)
            .bind(&event.user)
            .bind(&event.failure_topic)
            .bind(event.created_at)
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
        let rows = match cursor {
            None => {
                sqlx::query(
                    r#"
                    SELECT id, date FROM events
                    WHERE status = $1 AND date < $2
                    ORDER BY date, id
                    LIMIT $3
                    "#,
                )
                .bind(status)
                .bind(due_before)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            Some(cursor) => {
                sqlx::query(
                    r#"
                    SELECT id, date FROM events
                    WHERE status = $1 AND date < $2 AND (date, id) > ($3, $4)
                    ORDER BY date, id
                    LIMIT $5
                    "#,
                )
                .bind(status)
                .bind(due_before)
                .bind(cursor.date)
                .bind(cursor.id)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };

        let mut ids = Vec::with_capacity(rows.len());
        let mut last_key: Option<EventCursor> = None;
        for row in &rows {
            let id: Uuid = row.try_get("id")?;
            let date: DateTime<Utc> = row.try_get("date")?;
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
            FROM events WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(Self::row_to_event(&row)?)),
            None => Ok(None),
        }
    }
}

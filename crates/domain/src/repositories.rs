//! 领域仓储抽象
//!
//! 定义数据访问的抽象接口，遵循依赖倒置原则

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::entities::{EventRecord, EventStatus};
use event_scheduler_core::SchedulerResult;

/// 分页游标，指向上一页最后一条记录的 (date, id) 键
///
/// 游标严格单调：同一游标不会重复返回或跳过记录（不考虑并发写入）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventCursor {
    pub date: DateTime<Utc>,
    pub id: Uuid,
}

/// 一页到期事件，只投影id
#[derive(Debug, Clone, Default)]
pub struct EventPage {
    pub ids: Vec<Uuid>,
    /// 仅当本页满页时存在，短页即最后一页
    pub next_cursor: Option<EventCursor>,
}

impl EventPage {
    pub fn count(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// 事件仓储抽象
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// 批量持久化事件记录，整批原子提交
    async fn insert_batch(&self, events: &[EventRecord]) -> SchedulerResult<()>;

    /// 按 (status, date) 二级索引查询到期事件
    ///
    /// 返回 `status` 等值匹配且 `date` 严格小于 `due_before` 的记录id，
    /// 按 (date, id) 排序，从 `cursor` 之后开始，最多 `limit` 条。
    async fn find_due(
        &self,
        status: EventStatus,
        due_before: DateTime<Utc>,
        limit: i64,
        cursor: Option<EventCursor>,
    ) -> SchedulerResult<EventPage>;

    async fn get_by_id(&self, id: Uuid) -> SchedulerResult<Option<EventRecord>>;
}

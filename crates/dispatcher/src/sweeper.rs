//! 到期事件扫描
//!
//! 周期性扫描事件存储中到期且仍为NEW状态的记录，分页加载并批量分发。
//! 扫描本身无状态，每次运行都从空游标开始。

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, info};

use event_scheduler_core::{SchedulerResult, SweeperConfig};
use event_scheduler_domain::entities::EventStatus;
use event_scheduler_domain::repositories::{EventCursor, EventRepository};

use crate::batch::BatchDispatcher;

/// 到期扫描器
///
/// 查询窗口是 now + horizon_minutes：扫描间隔小于窗口时，临近到期的
/// 记录不会在两轮扫描之间滞留；入队侧的快速通道为近期事件提供双重覆盖。
///
/// 重叠运行的两次扫描可能在状态迁移落地前重复发现同一记录，
/// 本扫描器不做互斥——分发语义是至少一次，下游需要幂等。
pub struct Sweeper {
    repository: Arc<dyn EventRepository>,
    dispatcher: Arc<BatchDispatcher>,
    config: SweeperConfig,
}

impl Sweeper {
    pub fn new(
        repository: Arc<dyn EventRepository>,
        dispatcher: Arc<BatchDispatcher>,
        config: SweeperConfig,
    ) -> Self {
        Self {
            repository,
            dispatcher,
            config,
        }
    }

    /// 执行单次扫描，返回本次发现并分发的事件总数
    ///
    /// 空页或游标耗尽即终止；游标严格单调，同一页不会被重复加载。
    pub async fn run_once(&self) -> SchedulerResult<u64> {
        let until = Utc::now() + Duration::minutes(self.config.horizon_minutes);

        let mut cursor: Option<EventCursor> = None;
        let mut total: u64 = 0;

        loop {
            let page = self
                .repository
                .find_due(EventStatus::New, until, self.config.page_size, cursor)
                .await?;

            if page.is_empty() {
                break;
            }
            total += page.count() as u64;

            self.dispatcher.dispatch(&page.ids).await;

            match page.next_cursor {
                Some(next) => {
                    debug!("继续加载下一页");
                    cursor = Some(next);
                }
                None => {
                    debug!("到期事件加载完成");
                    break;
                }
            }
        }

        info!("本次扫描共批处理 {} 条事件", total);
        Ok(total)
    }
}

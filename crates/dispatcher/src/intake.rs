//! 事件入队处理
//!
//! 逐条校验提交的事件，构建持久化记录并识别快速通道事件：
//! 距执行时间不足阈值（默认10分钟）的事件在入队时立即分发，
//! 不等待下一轮到期扫描。

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use event_scheduler_core::{IntakeConfig, SchedulerResult};
use event_scheduler_domain::entities::{parse_event_date, EventRecord, SubmittedEvent};
use event_scheduler_domain::messaging::FailureNotifier;
use event_scheduler_domain::repositories::EventRepository;

use crate::batch::BatchDispatcher;
use crate::time_utils::within_minutes;

/// 事件被拒绝的原因，文案即失败通知中的error字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    DateRequired,
    PayloadRequired,
    TargetRequired,
    PayloadNotString,
    DateNotTimestamp,
    UserRequired,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::DateRequired => "date is required",
            RejectReason::PayloadRequired => "payload is required",
            RejectReason::TargetRequired => "target is required",
            RejectReason::PayloadNotString => "payload must be a string",
            RejectReason::DateNotTimestamp => "date must be an ISO-8601 timestamp",
            RejectReason::UserRequired => "user is required",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单批入队的处理统计，调用方拿不到逐条错误，只有计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IntakeSummary {
    pub received: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub fast_tracked: usize,
}

pub struct IntakeService {
    repository: Arc<dyn EventRepository>,
    dispatcher: Arc<BatchDispatcher>,
    notifier: Arc<dyn FailureNotifier>,
    config: IntakeConfig,
}

impl IntakeService {
    pub fn new(
        repository: Arc<dyn EventRepository>,
        dispatcher: Arc<BatchDispatcher>,
        notifier: Arc<dyn FailureNotifier>,
        config: IntakeConfig,
    ) -> Self {
        Self {
            repository,
            dispatcher,
            notifier,
            config,
        }
    }

    /// 处理一批提交的事件
    ///
    /// 校验失败的事件被跳过并尽力通知，不影响同批其他事件；
    /// 所有接受的记录在任何分发发生之前批量持久化——下游函数
    /// 被调用后会立即按id读取记录，持久化失败对整批是致命的。
    pub async fn process_batch(&self, events: Vec<SubmittedEvent>) -> SchedulerResult<IntakeSummary> {
        let received = events.len();
        let now = Utc::now();

        let mut records: Vec<EventRecord> = Vec::new();
        let mut fast_track: Vec<Uuid> = Vec::new();
        let mut rejected = 0usize;

        for event in events {
            let record = match self.validate(&event) {
                Ok(record) => record,
                Err(reason) => {
                    rejected += 1;
                    self.reject(event, reason).await;
                    continue;
                }
            };

            if within_minutes(record.date, now, self.config.fast_track_minutes) {
                fast_track.push(record.id);
            }

            info!(event_id = %record.id, target = %record.target, "event.consumed");
            records.push(record);
        }

        self.repository.insert_batch(&records).await?;

        if !fast_track.is_empty() {
            info!("快速通道分发 {} 条事件", fast_track.len());
        }
        self.dispatcher.dispatch(&fast_track).await;

        let summary = IntakeSummary {
            received,
            accepted: records.len(),
            rejected,
            fast_tracked: fast_track.len(),
        };
        info!(
            "本批入队完成: 接收 {} 条, 接受 {} 条, 拒绝 {} 条, 快速通道 {} 条",
            summary.received, summary.accepted, summary.rejected, summary.fast_tracked
        );

        Ok(summary)
    }

    fn validate(&self, event: &SubmittedEvent) -> Result<EventRecord, RejectReason> {
        let Some(date_raw) = &event.date else {
            return Err(RejectReason::DateRequired);
        };
        let Some(payload) = &event.payload else {
            return Err(RejectReason::PayloadRequired);
        };
        let Some(target) = &event.target else {
            return Err(RejectReason::TargetRequired);
        };
        let Some(payload) = payload.as_str() else {
            return Err(RejectReason::PayloadNotString);
        };
        let date = parse_event_date(date_raw).map_err(|_| RejectReason::DateNotTimestamp)?;

        if event.user.is_none() && self.config.enforce_user {
            return Err(RejectReason::UserRequired);
        }

        Ok(EventRecord::new(
            date,
            payload.to_string(),
            target.clone(),
            event.user.clone(),
            event.failure_topic.clone(),
        ))
    }

    /// 拒绝事件：记录日志并尽力发布失败通知
    ///
    /// 通知失败只记录日志，绝不中断同批其他事件的处理，
    /// 也不能掩盖原始的校验错误。
    async fn reject(&self, event: SubmittedEvent, reason: RejectReason) {
        warn!(reason = %reason, event = ?event, "event.rejected");

        let Some(channel) = event.failure_topic.clone() else {
            return;
        };

        let notification = serde_json::json!({
            "error": reason.as_str(),
            "event": event,
        });
        let payload = match serde_json::to_vec(&notification) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("序列化失败通知失败: {}", e);
                return;
            }
        };

        if let Err(e) = self.notifier.publish(&channel, payload).await {
            warn!("发布失败通知到 {} 失败: {}", channel, e);
        }
    }
}

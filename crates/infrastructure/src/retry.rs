//! 持久化写入重试
//!
//! 瞬时的存储写入失败按指数退避重试；重试耗尽后错误向上传播，
//! 由调用方判定整批失败——分发未持久化的记录会产生悬空引用。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{error, warn};
use uuid::Uuid;

use event_scheduler_core::{SchedulerResult, StoreConfig};
use event_scheduler_domain::entities::{EventRecord, EventStatus};
use event_scheduler_domain::repositories::{EventCursor, EventPage, EventRepository};

/// 重试策略配置
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 首次失败后的最大重试次数
    pub max_retries: u32,
    /// 基础重试间隔（毫秒）
    pub base_delay_ms: u64,
    /// 指数退避倍数
    pub backoff_multiplier: f64,
    /// 重试间隔的随机抖动范围（0.0-1.0）
    pub jitter_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 100,
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
        }
    }
}

impl RetryPolicy {
    pub fn from_store_config(config: &StoreConfig) -> Self {
        Self {
            max_retries: config.write_max_retries,
            base_delay_ms: config.write_retry_base_delay_ms,
            backoff_multiplier: config.write_retry_backoff_multiplier,
            ..Self::default()
        }
    }

    /// 计算第 `attempt` 次重试前的等待时间（attempt从0开始）
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.base_delay_ms as f64;
        let exponential = base * self.backoff_multiplier.powi(attempt as i32);

        // 随机抖动避免雷群效应
        let jitter = exponential * self.jitter_factor * (rand::random::<f64>() - 0.5) * 2.0;
        let delay_ms = (exponential + jitter).max(0.0);

        Duration::from_millis(delay_ms as u64)
    }
}

/// 为事件仓储的批量写入增加有界重试的装饰器
///
/// 只有写入路径会重试，读取路径直接委托给内部仓储。
pub struct RetryingEventRepository {
    inner: Arc<dyn EventRepository>,
    policy: RetryPolicy,
}

impl RetryingEventRepository {
    pub fn new(inner: Arc<dyn EventRepository>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl EventRepository for RetryingEventRepository {
    async fn insert_batch(&self, events: &[EventRecord]) -> SchedulerResult<()> {
        let mut attempt = 0u32;
        loop {
            match self.inner.insert_batch(events).await {
                Ok(()) => return Ok(()),
                Err(e) if attempt < self.policy.max_retries => {
                    let delay = self.policy.delay_for_attempt(attempt);
                    attempt += 1;
                    warn!(
                        "批量持久化失败 (第{}次重试, {}ms后): {}",
                        attempt,
                        delay.as_millis(),
                        e
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    error!("批量持久化在 {} 次重试后仍失败: {}", attempt, e);
                    return Err(e);
                }
            }
        }
    }

    async fn find_due(
        &self,
        status: EventStatus,
        due_before: DateTime<Utc>,
        limit: i64,
        cursor: Option<EventCursor>,
    ) -> SchedulerResult<EventPage> {
        self.inner.find_due(status, due_before, limit, cursor).await
    }

    async fn get_by_id(&self, id: Uuid) -> SchedulerResult<Option<EventRecord>> {
        self.inner.get_by_id(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use event_scheduler_testing_utils::{EventRecordBuilder, MockEventRepository};

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay_ms: 1,
            backoff_multiplier: 1.0,
            jitter_factor: 0.0,
        }
    }

    #[tokio::test]
    async fn test_insert_retries_transient_failures() {
        let inner = Arc::new(MockEventRepository::new());
        inner.fail_next_inserts(2);
        let repository = RetryingEventRepository::new(inner.clone(), fast_policy(3));

        let events = vec![EventRecordBuilder::new().build()];
        repository.insert_batch(&events).await.unwrap();

        // 2次失败 + 1次成功
        assert_eq!(inner.insert_call_count(), 3);
        assert_eq!(inner.count(), 1);
    }

    #[tokio::test]
    async fn test_insert_propagates_after_retry_exhaustion() {
        let inner = Arc::new(MockEventRepository::new());
        inner.fail_next_inserts(10);
        let repository = RetryingEventRepository::new(inner.clone(), fast_policy(2));

        let events = vec![EventRecordBuilder::new().build()];
        let result = repository.insert_batch(&events).await;

        assert!(result.is_err());
        // 首次尝试 + 2次重试
        assert_eq!(inner.insert_call_count(), 3);
        assert_eq!(inner.count(), 0);
    }

    #[tokio::test]
    async fn test_reads_are_not_retried() {
        let inner = Arc::new(MockEventRepository::new());
        let repository = RetryingEventRepository::new(inner.clone(), fast_policy(3));

        let found = repository.get_by_id(Uuid::new_v4()).await.unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn test_delay_grows_exponentially() {
        let policy = RetryPolicy {
            max_retries: 3,
            base_delay_ms: 100,
            backoff_multiplier: 2.0,
            jitter_factor: 0.0,
        };
        assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(400));
    }
}

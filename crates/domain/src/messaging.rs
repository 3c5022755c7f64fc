//! 下游协作方抽象
//!
//! 下游调用与失败通知都是窄契约的外部协作方，超时与重试策略由实现方负责。

use async_trait::async_trait;
use event_scheduler_core::SchedulerResult;

/// 下游调用客户端
///
/// 对本系统而言调用是fire-and-forget：调用方只关心请求是否发出，
/// 不关心下游的执行结果。
#[async_trait]
pub trait InvocationClient: Send + Sync {
    /// 调用下游目标，payload始终为JSON编码的事件id列表
    async fn invoke(&self, target: &str, payload: Vec<u8>) -> SchedulerResult<()>;
}

/// 失败通知发布端，尽力而为
#[async_trait]
pub trait FailureNotifier: Send + Sync {
    async fn publish(&self, channel: &str, payload: Vec<u8>) -> SchedulerResult<()>;
}

//! 失败通知的Webhook实现

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use event_scheduler_core::{SchedulerError, SchedulerResult};
use event_scheduler_domain::messaging::FailureNotifier;

/// 将失败记录POST到事件声明的通知通道（URL）
pub struct WebhookFailureNotifier {
    client: reqwest::Client,
}

impl WebhookFailureNotifier {
    pub fn new(request_timeout_seconds: u64) -> SchedulerResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(request_timeout_seconds))
            .build()
            .map_err(|e| SchedulerError::Notification(format!("创建HTTP客户端失败: {e}")))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl FailureNotifier for WebhookFailureNotifier {
    async fn publish(&self, channel: &str, payload: Vec<u8>) -> SchedulerResult<()> {
        if !channel.starts_with("http://") && !channel.starts_with("https://") {
            return Err(SchedulerError::Notification(format!(
                "无效的通知通道: {channel}"
            )));
        }

        let response = self
            .client
            .post(channel)
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(|e| SchedulerError::Notification(format!("发布到 {channel} 失败: {e}")))?;

        if !response.status().is_success() {
            return Err(SchedulerError::Notification(format!(
                "发布到 {channel} 返回状态 {}",
                response.status()
            )));
        }

        debug!("已发布失败通知到 {}", channel);
        Ok(())
    }
}

//! 下游调用的HTTP实现

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use event_scheduler_core::{DispatchConfig, SchedulerError, SchedulerResult};
use event_scheduler_domain::messaging::InvocationClient;

/// 通过HTTP POST调用下游目标
///
/// 目标URL为 `{function_base_url}/{target}`，payload原样作为请求体。
/// 超时由此客户端负责，调用方只看到成功或失败。
pub struct HttpInvocationClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpInvocationClient {
    pub fn new(config: &DispatchConfig) -> SchedulerResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| SchedulerError::Invocation(format!("创建HTTP客户端失败: {e}")))?;

        Ok(Self {
            client,
            base_url: config.function_base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl InvocationClient for HttpInvocationClient {
    async fn invoke(&self, target: &str, payload: Vec<u8>) -> SchedulerResult<()> {
        let url = format!("{}/{}", self.base_url, target);

        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(|e| SchedulerError::Invocation(format!("调用 {url} 失败: {e}")))?;

        if !response.status().is_success() {
            return Err(SchedulerError::Invocation(format!(
                "调用 {url} 返回状态 {}",
                response.status()
            )));
        }

        debug!("已调用下游目标 {}", url);
        Ok(())
    }
}

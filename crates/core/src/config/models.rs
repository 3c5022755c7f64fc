use serde::{Deserialize, Serialize};

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connection_timeout_seconds: u64,
    pub idle_timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/event_scheduler".to_string(),
            max_connections: 10,
            min_connections: 1,
            connection_timeout_seconds: 30,
            idle_timeout_seconds: 600,
        }
    }
}

impl DatabaseConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.url.is_empty() {
            return Err(anyhow::anyhow!("数据库URL不能为空"));
        }

        let supported = ["postgresql://", "postgres://", "sqlite:"];
        if !supported.iter().any(|prefix| self.url.starts_with(prefix)) {
            return Err(anyhow::anyhow!("数据库URL必须是PostgreSQL或SQLite格式"));
        }

        if self.max_connections == 0 {
            return Err(anyhow::anyhow!("最大连接数必须大于0"));
        }

        if self.min_connections > self.max_connections {
            return Err(anyhow::anyhow!("最小连接数不能大于最大连接数"));
        }

        if self.connection_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("连接超时时间必须大于0"));
        }

        Ok(())
    }
}

/// 事件存储配置
///
/// index_name 指向 (status, date) 二级索引，写重试参数作用于批量持久化。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub index_name: String,
    pub write_max_retries: u32,
    pub write_retry_base_delay_ms: u64,
    pub write_retry_backoff_multiplier: f64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            index_name: "idx_events_status_date".to_string(),
            write_max_retries: 3,
            write_retry_base_delay_ms: 100,
            write_retry_backoff_multiplier: 2.0,
        }
    }
}

impl StoreConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.index_name.is_empty() {
            return Err(anyhow::anyhow!("索引名称不能为空"));
        }

        // 索引名会被拼接进SQL语句，只允许标识符字符
        if !self
            .index_name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(anyhow::anyhow!("无效的索引名称: {}", self.index_name));
        }

        if self.write_retry_base_delay_ms == 0 {
            return Err(anyhow::anyhow!("写重试基础间隔必须大于0"));
        }

        if self.write_retry_backoff_multiplier < 1.0 {
            return Err(anyhow::anyhow!("写重试退避倍数不能小于1.0"));
        }

        Ok(())
    }
}

/// 入队（Intake）配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeConfig {
    /// 是否强制要求事件携带user字段
    pub enforce_user: bool,
    /// 距执行时间不足该分钟数的事件走快速通道
    pub fast_track_minutes: i64,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            enforce_user: false,
            fast_track_minutes: 10,
        }
    }
}

impl IntakeConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.fast_track_minutes <= 0 {
            return Err(anyhow::anyhow!("快速通道窗口必须大于0分钟"));
        }

        Ok(())
    }
}

/// 下游分发配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// 下游调用目标名称
    pub schedule_target: String,
    /// 单次调用携带的事件ID上限
    pub chunk_size: usize,
    /// 下游调用服务的基础URL
    pub function_base_url: String,
    pub request_timeout_seconds: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            schedule_target: "schedule".to_string(),
            chunk_size: 200,
            function_base_url: "http://localhost:9000/invoke".to_string(),
            request_timeout_seconds: 30,
        }
    }
}

impl DispatchConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.schedule_target.is_empty() {
            return Err(anyhow::anyhow!("下游调用目标不能为空"));
        }

        if self.chunk_size == 0 {
            return Err(anyhow::anyhow!("分片大小必须大于0"));
        }

        if !self.function_base_url.starts_with("http://")
            && !self.function_base_url.starts_with("https://")
        {
            return Err(anyhow::anyhow!(
                "无效的下游调用URL: {}",
                self.function_base_url
            ));
        }

        if self.request_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("请求超时时间必须大于0"));
        }

        Ok(())
    }
}

/// 到期扫描（Sweep）配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweeperConfig {
    pub enabled: bool,
    /// 扫描间隔，应小于horizon_minutes以保证覆盖
    pub interval_seconds: u64,
    /// 扫描的未来时间窗口（分钟）
    pub horizon_minutes: i64,
    /// 单页查询条数上限
    pub page_size: i64,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_seconds: 60,
            horizon_minutes: 5,
            page_size: 5000,
        }
    }
}

impl SweeperConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.interval_seconds == 0 {
            return Err(anyhow::anyhow!("扫描间隔必须大于0"));
        }

        if self.horizon_minutes < 0 {
            return Err(anyhow::anyhow!("扫描时间窗口不能为负"));
        }

        if self.page_size <= 0 {
            return Err(anyhow::anyhow!("分页大小必须大于0"));
        }

        if self.interval_seconds > (self.horizon_minutes as u64) * 60 && self.horizon_minutes > 0 {
            return Err(anyhow::anyhow!(
                "扫描间隔({}秒)不能超过时间窗口({}分钟)，否则事件可能被遗漏",
                self.interval_seconds,
                self.horizon_minutes
            ));
        }

        Ok(())
    }
}

/// API服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enabled: bool,
    pub bind_address: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

impl ApiConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.bind_address.is_empty() {
            return Err(anyhow::anyhow!("API监听地址不能为空"));
        }

        if !self.bind_address.contains(':') {
            return Err(anyhow::anyhow!("无效的监听地址: {}", self.bind_address));
        }

        Ok(())
    }
}

/// 可观测性配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl ObservabilityConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(anyhow::anyhow!("无效的日志级别: {}", self.log_level));
        }

        Ok(())
    }
}

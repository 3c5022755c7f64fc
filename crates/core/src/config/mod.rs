mod models;

pub use models::{
    ApiConfig, DatabaseConfig, DispatchConfig, IntakeConfig, ObservabilityConfig, StoreConfig,
    SweeperConfig,
};

use ::config::{Config as ConfigBuilder, Environment, File, FileFormat};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// System configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub store: StoreConfig,
    pub intake: IntakeConfig,
    pub dispatch: DispatchConfig,
    pub sweeper: SweeperConfig,
    pub api: ApiConfig,
    pub observability: ObservabilityConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            store: StoreConfig::default(),
            intake: IntakeConfig::default(),
            dispatch: DispatchConfig::default(),
            sweeper: SweeperConfig::default(),
            api: ApiConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from config file and environment variables
    ///
    /// Load order:
    /// 1. Default configuration
    /// 2. Config file (TOML format)
    /// 3. Environment variable overrides (prefix: SCHEDULER__)
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = ConfigBuilder::builder();

        builder = Self::set_defaults(builder)?;

        // 1. Load config file if provided
        if let Some(path) = config_path {
            if Path::new(path).exists() {
                builder = builder.add_source(File::new(path, FileFormat::Toml));
            } else {
                return Err(anyhow::anyhow!("配置文件不存在: {}", path));
            }
        } else {
            // Try to load default config files
            let default_paths = [
                "config/event-scheduler.toml",
                "event-scheduler.toml",
                "/etc/event-scheduler/config.toml",
            ];

            for path in &default_paths {
                if Path::new(path).exists() {
                    builder = builder.add_source(File::new(path, FileFormat::Toml));
                    break;
                }
            }
        }

        // 2. Environment variable overrides - highest priority
        // e.g. SCHEDULER__INTAKE__ENFORCE_USER=true
        builder = builder.add_source(
            Environment::with_prefix("SCHEDULER")
                .separator("__")
                .try_parsing(true),
        );

        // Build configuration
        let config: AppConfig = builder
            .build()
            .context("构建配置失败")?
            .try_deserialize()
            .context("反序列化配置失败")?;

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    fn set_defaults(
        builder: ::config::builder::ConfigBuilder<::config::builder::DefaultState>,
    ) -> Result<::config::builder::ConfigBuilder<::config::builder::DefaultState>> {
        let defaults = Self::default();
        Ok(builder
            .set_default("database.url", defaults.database.url)?
            .set_default("database.max_connections", defaults.database.max_connections)?
            .set_default("database.min_connections", defaults.database.min_connections)?
            .set_default(
                "database.connection_timeout_seconds",
                defaults.database.connection_timeout_seconds,
            )?
            .set_default(
                "database.idle_timeout_seconds",
                defaults.database.idle_timeout_seconds,
            )?
            .set_default("store.index_name", defaults.store.index_name)?
            .set_default("store.write_max_retries", defaults.store.write_max_retries)?
            .set_default(
                "store.write_retry_base_delay_ms",
                defaults.store.write_retry_base_delay_ms,
            )?
            .set_default(
                "store.write_retry_backoff_multiplier",
                defaults.store.write_retry_backoff_multiplier,
            )?
            .set_default("intake.enforce_user", defaults.intake.enforce_user)?
            .set_default("intake.fast_track_minutes", defaults.intake.fast_track_minutes)?
            .set_default("dispatch.schedule_target", defaults.dispatch.schedule_target)?
            .set_default("dispatch.chunk_size", defaults.dispatch.chunk_size as i64)?
            .set_default("dispatch.function_base_url", defaults.dispatch.function_base_url)?
            .set_default(
                "dispatch.request_timeout_seconds",
                defaults.dispatch.request_timeout_seconds,
            )?
            .set_default("sweeper.enabled", defaults.sweeper.enabled)?
            .set_default("sweeper.interval_seconds", defaults.sweeper.interval_seconds)?
            .set_default("sweeper.horizon_minutes", defaults.sweeper.horizon_minutes)?
            .set_default("sweeper.page_size", defaults.sweeper.page_size)?
            .set_default("api.enabled", defaults.api.enabled)?
            .set_default("api.bind_address", defaults.api.bind_address)?
            .set_default("observability.log_level", defaults.observability.log_level)?)
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(toml_str).context("解析TOML配置失败")?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("序列化配置为TOML失败")
    }

    /// Validate configuration effectiveness
    pub fn validate(&self) -> Result<()> {
        self.database.validate().context("数据库配置验证失败")?;
        self.store.validate().context("存储配置验证失败")?;
        self.intake.validate().context("入队配置验证失败")?;
        self.dispatch.validate().context("分发配置验证失败")?;
        self.sweeper.validate().context("扫描配置验证失败")?;
        self.api.validate().context("API配置验证失败")?;
        self.observability.validate().context("可观测性配置验证失败")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.dispatch.chunk_size, 200);
        assert_eq!(config.intake.fast_track_minutes, 10);
        assert_eq!(config.sweeper.horizon_minutes, 5);
        assert_eq!(config.sweeper.page_size, 5000);
        assert!(!config.intake.enforce_user);
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = AppConfig::default();
        let toml_str = config.to_toml().unwrap();
        let parsed = AppConfig::from_toml(&toml_str).unwrap();
        assert_eq!(parsed.store.index_name, config.store.index_name);
        assert_eq!(parsed.dispatch.schedule_target, config.dispatch.schedule_target);
    }

    #[test]
    fn test_from_toml_overrides() {
        let mut config = AppConfig::default();
        config.intake.enforce_user = true;
        config.dispatch.chunk_size = 50;
        let parsed = AppConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert!(parsed.intake.enforce_user);
        assert_eq!(parsed.dispatch.chunk_size, 50);
    }

    #[test]
    fn test_invalid_chunk_size_rejected() {
        let mut config = AppConfig::default();
        config.dispatch.chunk_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_index_name_rejected() {
        let mut config = AppConfig::default();
        config.store.index_name = "bad-name; DROP TABLE events".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let mut config = AppConfig::default();
        config.observability.log_level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scheduler.toml");
        let mut config = AppConfig::default();
        config.dispatch.schedule_target = "schedule-func".to_string();
        std::fs::write(&path, config.to_toml().unwrap()).unwrap();

        let loaded = AppConfig::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(loaded.dispatch.schedule_target, "schedule-func");
    }

    #[test]
    fn test_load_missing_file_fails() {
        assert!(AppConfig::load(Some("/nonexistent/scheduler.toml")).is_err());
    }
}

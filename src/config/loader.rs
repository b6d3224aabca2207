//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `STEMWERK_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `STEMWERK_SERVER__PORT=8080`
/// - `STEMWERK_PIPER__MODEL_PATH=/models/nl.onnx`
/// - `STEMWERK_PARKIET__REQUIRE_GPU=false`
/// - `STEMWERK_CACHE__TTL_DAYS=30`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 首先设置默认值（最低优先级）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8000)?
        .set_default("piper.enabled", true)?
        .set_default("piper.binary_path", "piper")?
        .set_default("piper.model_path", "models/nl_BE-nathalie-medium.onnx")?
        .set_default("parkiet.enabled", true)?
        .set_default("parkiet.worker_binary", "parkiet-worker")?
        .set_default("parkiet.model_id", "pevers/parkiet")?
        .set_default("parkiet.require_gpu", true)?
        .set_default("parkiet.idle_unload_secs", 300)?
        .set_default("parkiet.request_timeout_secs", 120)?
        .set_default("cache.dir", "data/tts-cache")?
        .set_default("cache.ttl_days", 7)?
        .set_default("transcoder.ffmpeg_binary", "ffmpeg")?
        .set_default("transcoder.mp3_bitrate", 64000)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 添加配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        // 搜索默认配置文件
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 添加环境变量（最高优先级）
    // 前缀: STEMWERK_
    // 层级分隔符: __ (双下划线)
    // 例如: STEMWERK_PARKIET__IDLE_UNLOAD_SECS=600
    builder = builder.add_source(
        Environment::with_prefix("STEMWERK")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    // 4. 构建配置
    let config = builder.build()?;

    // 5. 反序列化为 AppConfig
    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::ParseError(format!("Failed to deserialize config: {}", e)))?;

    // 6. 验证配置
    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    // 至少要有一个引擎，否则服务无法合成任何音频
    if !config.piper.enabled && !config.parkiet.enabled {
        return Err(ConfigError::ValidationError(
            "At least one engine must be enabled".to_string(),
        ));
    }

    if config.piper.enabled && config.piper.binary_path.is_empty() {
        return Err(ConfigError::ValidationError(
            "Piper binary path cannot be empty".to_string(),
        ));
    }

    if config.parkiet.enabled {
        if config.parkiet.worker_binary.is_empty() {
            return Err(ConfigError::ValidationError(
                "Parkiet worker binary cannot be empty".to_string(),
            ));
        }
        if config.parkiet.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "Parkiet request timeout cannot be 0".to_string(),
            ));
        }
    }

    if config.cache.dir.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "Cache directory cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}:{}", config.server.host, config.server.port);
    tracing::info!("Piper Enabled: {}", config.piper.enabled);
    if config.piper.enabled {
        tracing::info!("Piper Binary: {}", config.piper.binary_path);
        tracing::info!("Piper Model: {:?}", config.piper.model_path);
    }
    tracing::info!("Parkiet Enabled: {}", config.parkiet.enabled);
    if config.parkiet.enabled {
        tracing::info!("Parkiet Worker: {}", config.parkiet.worker_binary);
        tracing::info!("Parkiet Model: {}", config.parkiet.model_id);
        tracing::info!("Parkiet Require GPU: {}", config.parkiet.require_gpu);
        tracing::info!("Parkiet Idle Unload: {}s", config.parkiet.idle_unload_secs);
    }
    tracing::info!("Cache Directory: {:?}", config.cache.dir);
    tracing::info!("Cache TTL: {} days", config.cache.ttl_days);
    tracing::info!("FFmpeg Binary: {}", config.transcoder.ffmpeg_binary);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

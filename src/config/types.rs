//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;

/// 应用主配置
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// Piper 引擎配置
    #[serde(default)]
    pub piper: PiperConfig,

    /// Parkiet 引擎配置
    #[serde(default)]
    pub parkiet: ParkietConfig,

    /// 音频缓存配置
    #[serde(default)]
    pub cache: CacheConfig,

    /// 转码器配置
    #[serde(default)]
    pub transcoder: TranscoderConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            piper: PiperConfig::default(),
            parkiet: ParkietConfig::default(),
            cache: CacheConfig::default(),
            transcoder: TranscoderConfig::default(),
            log: LogConfig::default(),
        }
    }
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Piper 引擎配置
#[derive(Debug, Clone, Deserialize)]
pub struct PiperConfig {
    /// 是否启用 Piper 引擎
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// piper 可执行文件路径
    #[serde(default = "default_piper_binary")]
    pub binary_path: String,

    /// 语音模型文件路径（.onnx）
    #[serde(default = "default_piper_model")]
    pub model_path: PathBuf,
}

fn default_true() -> bool {
    true
}

fn default_piper_binary() -> String {
    "piper".to_string()
}

fn default_piper_model() -> PathBuf {
    PathBuf::from("models/nl_BE-nathalie-medium.onnx")
}

impl Default for PiperConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            binary_path: default_piper_binary(),
            model_path: default_piper_model(),
        }
    }
}

/// Parkiet 引擎配置
#[derive(Debug, Clone, Deserialize)]
pub struct ParkietConfig {
    /// 是否启用 Parkiet 引擎
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// worker 可执行文件路径
    #[serde(default = "default_parkiet_worker")]
    pub worker_binary: String,

    /// worker 额外参数
    #[serde(default)]
    pub worker_args: Vec<String>,

    /// HuggingFace 模型 ID
    #[serde(default = "default_parkiet_model")]
    pub model_id: String,

    /// 是否要求 GPU 存在才报告可用
    #[serde(default = "default_true")]
    pub require_gpu: bool,

    /// 空闲卸载阈值（秒）
    #[serde(default = "default_idle_unload")]
    pub idle_unload_secs: u64,

    /// 单次合成请求超时（秒）
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_parkiet_worker() -> String {
    "parkiet-worker".to_string()
}

fn default_parkiet_model() -> String {
    "pevers/parkiet".to_string()
}

fn default_idle_unload() -> u64 {
    300
}

fn default_request_timeout() -> u64 {
    120
}

impl Default for ParkietConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            worker_binary: default_parkiet_worker(),
            worker_args: Vec::new(),
            model_id: default_parkiet_model(),
            require_gpu: default_true(),
            idle_unload_secs: default_idle_unload(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// 音频缓存配置
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// 缓存根目录
    #[serde(default = "default_cache_dir")]
    pub dir: PathBuf,

    /// 条目存活时间（天）
    #[serde(default = "default_cache_ttl")]
    pub ttl_days: u64,
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("data/tts-cache")
}

fn default_cache_ttl() -> u64 {
    7
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
            ttl_days: default_cache_ttl(),
        }
    }
}

/// 转码器配置
#[derive(Debug, Clone, Deserialize)]
pub struct TranscoderConfig {
    /// ffmpeg 可执行文件路径
    #[serde(default = "default_ffmpeg_binary")]
    pub ffmpeg_binary: String,

    /// MP3 目标比特率（bps）
    #[serde(default = "default_mp3_bitrate")]
    pub mp3_bitrate: u32,
}

fn default_ffmpeg_binary() -> String {
    "ffmpeg".to_string()
}

fn default_mp3_bitrate() -> u32 {
    64000 // 64kbps，语音足够
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_binary: default_ffmpeg_binary(),
            mp3_bitrate: default_mp3_bitrate(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

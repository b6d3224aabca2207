//! Stemwerk - 荷兰语 TTS 编排服务
//!
//! 架构设计: Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - normalizer: Parkiet 引擎的文本归一化管道
//! - numerals: 荷兰语数字转文字
//!
//! 应用层 (application/):
//! - Ports: 端口定义（SpeechEngine, AudioCache, AudioTranscoder）
//! - Orchestrator: 引擎选择 + 缓存探测 + 失败回退编排
//! - Error: 合成错误分类
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful API (axum)
//! - Adapters: Piper / Parkiet 引擎适配器, FFmpeg 转码器
//! - Persistence: 文件系统音频缓存（按指纹分桶 + TTL 过期）

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};

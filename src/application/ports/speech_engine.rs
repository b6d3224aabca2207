//! Speech Engine Port - 语音合成引擎抽象
//!
//! 定义合成引擎的抽象接口，具体实现在 infrastructure/adapters 层。
//! 引擎集合是封闭的（Piper / Parkiet），编排器持有已配置实例的引用，
//! 不需要开放式扩展。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 引擎错误
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Synthesis process failed: {0}")]
    ProcessFailed(String),

    #[error("Model load failed: {0}")]
    ModelLoadFailed(String),

    #[error("Engine protocol error: {0}")]
    ProtocolError(String),

    #[error("IO error: {0}")]
    IoError(String),
}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        EngineError::IoError(e.to_string())
    }
}

/// 引擎标识（封闭集合）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineId {
    Piper,
    Parkiet,
}

impl EngineId {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineId::Piper => "piper",
            EngineId::Parkiet => "parkiet",
        }
    }
}

impl std::fmt::Display for EngineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 质量等级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineQuality {
    Basic,
    High,
}

/// 速度等级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineSpeed {
    Fast,
    Slow,
}

/// 引擎静态描述符
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineDescriptor {
    pub id: EngineId,
    pub quality: EngineQuality,
    pub speed: EngineSpeed,
}

/// Speech Engine Port
///
/// 每个引擎实现：
/// - `synthesize`: 文本 + 音色 -> WAV 字节（可能阻塞 / 执行 I/O）
/// - `is_available`: 廉价、无副作用的可用性探测（如 GPU 存在性）
/// - `descriptor`: 静态身份信息
#[async_trait]
pub trait SpeechEnginePort: Send + Sync {
    /// 合成音频，返回自描述的 WAV 容器字节
    async fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<u8>, EngineError>;

    /// 引擎当前是否可用（可能随调用变化，如 GPU 热插拔）
    fn is_available(&self) -> bool;

    /// 引擎静态描述符
    fn descriptor(&self) -> EngineDescriptor;
}

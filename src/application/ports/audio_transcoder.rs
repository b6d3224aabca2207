//! Audio Transcoder Port - 音频转码抽象
//!
//! 定义音频转码的抽象接口，将引擎输出的 WAV 转换为请求的输出格式。
//! 转码失败对编排器而言是软错误：记录日志后返回原始 WAV。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 转码错误
#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// 音频输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    /// 引擎原生容器，不转码
    #[default]
    Wav,
    /// MP3，通过外部 ffmpeg 子进程转码
    Mp3,
}

impl AudioFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "audio/wav",
            AudioFormat::Mp3 => "audio/mpeg",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "wav",
            AudioFormat::Mp3 => "mp3",
        }
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

impl std::str::FromStr for AudioFormat {
    type Err = TranscodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "wav" => Ok(AudioFormat::Wav),
            "mp3" => Ok(AudioFormat::Mp3),
            _ => Err(TranscodeError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// WAV 音频信息（从容器头解析）
#[derive(Debug, Clone)]
pub struct AudioInfo {
    /// 时长（毫秒）
    pub duration_ms: u64,
    /// 采样率
    pub sample_rate: u32,
    /// 声道数
    pub channels: u8,
    /// 位深度
    pub bits_per_sample: u16,
    /// 数据大小（字节）
    pub data_size: usize,
}

/// Audio Transcoder Port
#[async_trait]
pub trait AudioTranscoderPort: Send + Sync {
    /// 转码 WAV 音频到目标格式
    ///
    /// `AudioFormat::Wav` 为直通（返回原始字节）。
    async fn transcode(&self, wav_data: &[u8], format: AudioFormat)
        -> Result<Vec<u8>, TranscodeError>;

    /// 解析音频信息（不转码）
    fn audio_info(&self, wav_data: &[u8]) -> Result<AudioInfo, TranscodeError>;
}

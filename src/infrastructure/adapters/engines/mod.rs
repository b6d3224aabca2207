//! 语音合成引擎适配器
//!
//! - Piper: 快速、CPU、子进程调用，始终可用
//! - Parkiet: 高质量、GPU、惰性加载、互斥锁串行化
//! - Fake: 测试用，返回固定音频

mod fake;
mod parkiet;
mod piper;

pub use fake::FakeEngine;
pub use parkiet::{ParkietEngine, ParkietEngineConfig};
pub use piper::{PiperEngine, PiperEngineConfig, PIPER_SAMPLE_RATE};

use crate::application::ports::EngineError;

/// 将原始 16-bit 单声道 PCM 包装进 WAV 容器
///
/// 每个引擎都用它把原始采样变成自描述的音频 blob。
pub fn pcm_to_wav(pcm: &[u8], sample_rate: u32) -> Result<Vec<u8>, EngineError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| EngineError::IoError(e.to_string()))?;
        for sample in pcm.chunks_exact(2) {
            writer
                .write_sample(i16::from_le_bytes([sample[0], sample[1]]))
                .map_err(|e| EngineError::IoError(e.to_string()))?;
        }
        writer
            .finalize()
            .map_err(|e| EngineError::IoError(e.to_string()))?;
    }
    Ok(cursor.into_inner())
}

/// stderr 尾部截断，用于错误信息
pub(crate) fn stderr_tail(stderr: &[u8], max_chars: usize) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    let count = text.chars().count();
    if count <= max_chars {
        text.to_string()
    } else {
        text.chars().skip(count - max_chars).collect()
    }
}

//! FFmpeg Transcoder - 外部子进程音频转码
//!
//! WAV 从 stdin 喂入 ffmpeg，转码结果从 stdout 读出。
//! 支持：
//! - WAV pass-through（不转码）
//! - WAV → MP3
//! - WAV 头解析（时长 / 采样率，用于日志）

use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::application::ports::{AudioFormat, AudioInfo, AudioTranscoderPort, TranscodeError};

/// FFmpeg 转码器配置
#[derive(Debug, Clone)]
pub struct FfmpegTranscoderConfig {
    /// ffmpeg 可执行文件
    pub binary_path: String,
    /// MP3 比特率（bps），语音 64k 足够
    pub mp3_bitrate: u32,
}

impl Default for FfmpegTranscoderConfig {
    fn default() -> Self {
        Self {
            binary_path: "ffmpeg".to_string(),
            mp3_bitrate: 64_000,
        }
    }
}

/// FFmpeg 转码器
pub struct FfmpegTranscoder {
    config: FfmpegTranscoderConfig,
}

impl FfmpegTranscoder {
    pub fn new(config: FfmpegTranscoderConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(FfmpegTranscoderConfig::default())
    }

    async fn run_ffmpeg(&self, wav_data: &[u8], args: &[&str]) -> Result<Vec<u8>, TranscodeError> {
        let mut child = Command::new(&self.config.binary_path)
            .args(["-hide_banner", "-loglevel", "error", "-f", "wav", "-i", "pipe:0"])
            .args(args)
            .arg("pipe:1")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                TranscodeError::IoError(format!(
                    "failed to spawn {}: {}",
                    self.config.binary_path, e
                ))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(wav_data)
                .await
                .map_err(|e| TranscodeError::IoError(e.to_string()))?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| TranscodeError::IoError(e.to_string()))?;

        if !output.status.success() {
            let err = String::from_utf8_lossy(&output.stderr);
            return Err(TranscodeError::EncodingError(format!(
                "ffmpeg exited with {}: {}",
                output.status,
                err.trim()
            )));
        }

        Ok(output.stdout)
    }
}

#[async_trait]
impl AudioTranscoderPort for FfmpegTranscoder {
    async fn transcode(
        &self,
        wav_data: &[u8],
        format: AudioFormat,
    ) -> Result<Vec<u8>, TranscodeError> {
        match format {
            AudioFormat::Wav => Ok(wav_data.to_vec()),
            AudioFormat::Mp3 => {
                let bitrate = format!("{}", self.config.mp3_bitrate);
                let out = self
                    .run_ffmpeg(wav_data, &["-f", "mp3", "-b:a", &bitrate])
                    .await?;
                tracing::debug!(
                    original_size = wav_data.len(),
                    transcoded_size = out.len(),
                    "wav transcoded to mp3"
                );
                Ok(out)
            }
        }
    }

    fn audio_info(&self, wav_data: &[u8]) -> Result<AudioInfo, TranscodeError> {
        parse_wav_info(wav_data)
    }
}

/// 解析 WAV 头，提取音频信息
pub fn parse_wav_info(data: &[u8]) -> Result<AudioInfo, TranscodeError> {
    if data.len() < 44 {
        return Err(TranscodeError::InvalidInput("WAV data too short".to_string()));
    }
    if &data[0..4] != b"RIFF" {
        return Err(TranscodeError::InvalidInput(
            "Invalid WAV: missing RIFF header".to_string(),
        ));
    }
    if &data[8..12] != b"WAVE" {
        return Err(TranscodeError::InvalidInput(
            "Invalid WAV: missing WAVE identifier".to_string(),
        ));
    }

    let mut pos = 12;
    let mut fmt: Option<(u16, u32, u16, u16)> = None; // (channels, rate, block_align, bits)
    let mut data_size = 0usize;

    while pos + 8 <= data.len() {
        let chunk_id = &data[pos..pos + 4];
        let chunk_size =
            u32::from_le_bytes([data[pos + 4], data[pos + 5], data[pos + 6], data[pos + 7]])
                as usize;

        match chunk_id {
            b"fmt " => {
                if chunk_size < 16 || pos + 8 + 16 > data.len() {
                    return Err(TranscodeError::InvalidInput(
                        "Invalid fmt chunk".to_string(),
                    ));
                }
                let f = &data[pos + 8..pos + 24];
                fmt = Some((
                    u16::from_le_bytes([f[2], f[3]]),
                    u32::from_le_bytes([f[4], f[5], f[6], f[7]]),
                    u16::from_le_bytes([f[12], f[13]]),
                    u16::from_le_bytes([f[14], f[15]]),
                ));
            }
            b"data" => {
                data_size = chunk_size;
                break;
            }
            _ => {}
        }

        pos += 8 + chunk_size;
        // 对齐到偶数字节
        if chunk_size % 2 != 0 {
            pos += 1;
        }
    }

    let (channels, sample_rate, block_align, bits_per_sample) = fmt.ok_or_else(|| {
        TranscodeError::InvalidInput("Invalid WAV: missing fmt chunk".to_string())
    })?;
    if data_size == 0 {
        return Err(TranscodeError::InvalidInput(
            "Invalid WAV: missing data chunk".to_string(),
        ));
    }

    let bytes_per_second = sample_rate as u64 * block_align as u64;
    let duration_ms = if bytes_per_second > 0 {
        data_size as u64 * 1000 / bytes_per_second
    } else {
        0
    };

    Ok(AudioInfo {
        duration_ms,
        sample_rate,
        channels: channels as u8,
        bits_per_sample,
        data_size,
    })
}

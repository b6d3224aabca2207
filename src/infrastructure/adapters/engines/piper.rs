//! Piper Engine - 子进程调用 piper 合成
//!
//! 快速、纯 CPU、每次调用独立子进程（无共享状态，并发不受限）。
//! 文本写入 stdin，原始 PCM 从 stdout 读出，包装为 WAV。

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::{pcm_to_wav, stderr_tail};
use crate::application::ports::{
    EngineDescriptor, EngineError, EngineId, EngineQuality, EngineSpeed, SpeechEnginePort,
};

/// Piper 输出 22050 Hz 单声道 16-bit PCM
pub const PIPER_SAMPLE_RATE: u32 = 22050;

/// Piper 引擎配置
#[derive(Debug, Clone)]
pub struct PiperEngineConfig {
    /// piper 可执行文件
    pub binary_path: String,
    /// 语音模型路径（.onnx）
    pub model_path: PathBuf,
}

impl Default for PiperEngineConfig {
    fn default() -> Self {
        Self {
            binary_path: "piper".to_string(),
            model_path: PathBuf::from("models/nl_BE-nathalie-medium.onnx"),
        }
    }
}

/// Piper 引擎
pub struct PiperEngine {
    config: PiperEngineConfig,
}

impl PiperEngine {
    pub fn new(config: PiperEngineConfig) -> Self {
        tracing::info!(
            binary = %config.binary_path,
            model = %config.model_path.display(),
            "PiperEngine ready"
        );
        Self { config }
    }
}

#[async_trait]
impl SpeechEnginePort for PiperEngine {
    async fn synthesize(&self, text: &str, _voice: &str) -> Result<Vec<u8>, EngineError> {
        let mut child = Command::new(&self.config.binary_path)
            .arg("--model")
            .arg(&self.config.model_path)
            .arg("--output_raw")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                EngineError::ProcessFailed(format!(
                    "failed to spawn {}: {}",
                    self.config.binary_path, e
                ))
            })?;

        // 写入文本并关闭 stdin（drop 关闭管道）
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes()).await?;
            stdin.write_all(b"\n").await?;
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            let err = stderr_tail(&output.stderr, 300);
            tracing::error!(error = %err, "piper synthesis failed");
            return Err(EngineError::ProcessFailed(format!("piper: {}", err)));
        }

        pcm_to_wav(&output.stdout, PIPER_SAMPLE_RATE)
    }

    fn is_available(&self) -> bool {
        // 纯 CPU，始终可用
        true
    }

    fn descriptor(&self) -> EngineDescriptor {
        EngineDescriptor {
            id: EngineId::Piper,
            quality: EngineQuality::Basic,
            speed: EngineSpeed::Fast,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::tempdir;

    /// 写一个可执行脚本模拟 piper 二进制
    fn fake_piper(dir: &std::path::Path, script: &str) -> PiperEngine {
        let path = dir.join("fake-piper");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", script)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        PiperEngine::new(PiperEngineConfig {
            binary_path: path.to_string_lossy().into_owned(),
            model_path: PathBuf::from("model.onnx"),
        })
    }

    #[tokio::test]
    async fn test_subprocess_output_wrapped_as_wav() {
        let dir = tempdir().unwrap();
        // 吞掉 stdin，输出 4 字节 PCM（2 个采样）
        let engine = fake_piper(dir.path(), "cat > /dev/null; printf 'ABCD'");

        let wav = engine.synthesize("hallo", "default").await.unwrap();
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(
            u32::from_le_bytes([wav[24], wav[25], wav[26], wav[27]]),
            PIPER_SAMPLE_RATE
        );
    }

    #[tokio::test]
    async fn test_nonzero_exit_carries_stderr() {
        let dir = tempdir().unwrap();
        let engine = fake_piper(dir.path(), "echo 'model ontbreekt' >&2; exit 1");

        let err = engine.synthesize("hallo", "default").await.unwrap_err();
        match err {
            EngineError::ProcessFailed(msg) => assert!(msg.contains("model ontbreekt")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_binary_is_process_failed() {
        let engine = PiperEngine::new(PiperEngineConfig {
            binary_path: "/nonexistent/piper".to_string(),
            model_path: PathBuf::from("model.onnx"),
        });

        let err = engine.synthesize("hallo", "default").await.unwrap_err();
        assert!(matches!(err, EngineError::ProcessFailed(_)));
    }

    #[test]
    fn test_descriptor_and_availability() {
        let engine = PiperEngine::new(PiperEngineConfig::default());
        assert!(engine.is_available());

        let d = engine.descriptor();
        assert_eq!(d.id, EngineId::Piper);
        assert_eq!(d.quality, EngineQuality::Basic);
        assert_eq!(d.speed, EngineSpeed::Fast);
    }
}

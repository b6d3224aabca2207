//! TTS Orchestrator - 合成请求编排
//!
//! 每个请求的状态机（请求之间无共享状态）：
//! 1. 选择引擎（显式指定或 auto 策略）
//! 2. 缓存探测（命中直接返回，不调用引擎）
//! 3. 调用引擎合成，计时
//! 4. 失败时回退到 Piper（至多一次，绝不循环）
//! 5. 可选的输出格式转换（失败时降级返回 WAV）
//!
//! 编排器从不直接修改引擎内部状态，只通过 SpeechEnginePort 契约交互。

use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use serde::Deserialize;

use super::error::SynthesisError;
use super::ports::{
    AudioCachePort, AudioFormat, AudioTranscoderPort, EngineDescriptor, EngineId, SpeechEnginePort,
};

/// 文本上限（trim 之后的字符数）
pub const MAX_TEXT_CHARS: usize = 5000;

/// 引擎选择器
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineSelector {
    #[default]
    Auto,
    Piper,
    Parkiet,
}

impl FromStr for EngineSelector {
    type Err = SynthesisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(EngineSelector::Auto),
            "piper" => Ok(EngineSelector::Piper),
            "parkiet" => Ok(EngineSelector::Parkiet),
            other => Err(SynthesisError::invalid(format!(
                "unknown engine: {} (expected piper, parkiet or auto)",
                other
            ))),
        }
    }
}

/// 合成请求
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    pub text: String,
    pub engine: EngineSelector,
    pub voice: String,
    pub output_format: AudioFormat,
}

impl SynthesisRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            engine: EngineSelector::Auto,
            voice: "default".to_string(),
            output_format: AudioFormat::Wav,
        }
    }

    pub fn with_engine(mut self, engine: EngineSelector) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = voice.into();
        self
    }

    pub fn with_output_format(mut self, format: AudioFormat) -> Self {
        self.output_format = format;
        self
    }
}

/// 合成结果（含来源信息）
#[derive(Debug, Clone)]
pub struct SynthesisResult {
    /// 音频字节（自描述容器）
    pub audio: Vec<u8>,
    /// 实际产出音频的引擎（回退后可能不同于请求的引擎）
    pub engine_used: EngineId,
    /// 是否来自缓存
    pub cached: bool,
    /// 合成耗时（毫秒），缓存命中为 0
    pub duration_ms: u64,
    /// 实际交付的格式（转码失败降级后可能是 Wav）
    pub format: AudioFormat,
}

/// 引擎运行时状态（/engines 接口使用）
#[derive(Debug, Clone, serde::Serialize)]
pub struct EngineStatus {
    pub id: EngineId,
    pub available: bool,
    pub quality: super::ports::EngineQuality,
    pub speed: super::ports::EngineSpeed,
}

impl EngineStatus {
    fn from_descriptor(d: EngineDescriptor, available: bool) -> Self {
        Self {
            id: d.id,
            available,
            quality: d.quality,
            speed: d.speed,
        }
    }
}

/// TTS 编排器
pub struct TtsOrchestrator {
    piper: Option<Arc<dyn SpeechEnginePort>>,
    parkiet: Option<Arc<dyn SpeechEnginePort>>,
    cache: Arc<dyn AudioCachePort>,
    transcoder: Arc<dyn AudioTranscoderPort>,
    default_engine: EngineId,
}

impl TtsOrchestrator {
    pub fn new(
        piper: Option<Arc<dyn SpeechEnginePort>>,
        parkiet: Option<Arc<dyn SpeechEnginePort>>,
        cache: Arc<dyn AudioCachePort>,
        transcoder: Arc<dyn AudioTranscoderPort>,
        default_engine: EngineId,
    ) -> Self {
        Self {
            piper,
            parkiet,
            cache,
            transcoder,
            default_engine,
        }
    }

    /// 默认引擎 ID（/engines 接口使用）
    pub fn default_engine(&self) -> EngineId {
        self.default_engine
    }

    /// 已配置引擎的有序状态列表（Piper 在前），附实时可用性
    pub fn available_engines(&self) -> Vec<EngineStatus> {
        let mut engines = Vec::new();
        if let Some(piper) = &self.piper {
            engines.push(EngineStatus::from_descriptor(
                piper.descriptor(),
                piper.is_available(),
            ));
        }
        if let Some(parkiet) = &self.parkiet {
            engines.push(EngineStatus::from_descriptor(
                parkiet.descriptor(),
                parkiet.is_available(),
            ));
        }
        engines
    }

    /// 合成音频
    pub async fn synthesize(
        &self,
        request: SynthesisRequest,
    ) -> Result<SynthesisResult, SynthesisError> {
        let text = request.text.trim();
        if text.is_empty() {
            return Err(SynthesisError::invalid("text may not be empty"));
        }
        if text.chars().count() > MAX_TEXT_CHARS {
            return Err(SynthesisError::invalid(format!(
                "text too long (max {} characters)",
                MAX_TEXT_CHARS
            )));
        }

        let mut engine = self.select_engine(request.engine)?;
        let mut engine_id = engine.descriptor().id;

        // 缓存探测：key 基于原始文本（与引擎专属归一化无关）
        // 缓存错误是软错误，按未命中处理
        match self
            .cache
            .get(engine_id.as_str(), &request.voice, text)
            .await
        {
            Ok(Some(audio)) => {
                tracing::debug!(engine = %engine_id, "serving synthesis from cache");
                return Ok(self
                    .finish(audio, engine_id, true, 0, request.output_format)
                    .await);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(engine = %engine_id, error = %e, "cache lookup failed, synthesizing fresh");
            }
        }

        let started = Instant::now();
        let audio = match engine.synthesize(text, &request.voice).await {
            Ok(audio) => audio,
            Err(e) => {
                // 回退：仅当失败的不是 Piper 且 Piper 已配置时重试一次
                let piper = match &self.piper {
                    Some(piper) if engine_id != EngineId::Piper => piper,
                    _ => {
                        return Err(SynthesisError::failed(format!(
                            "{} synthesis failed: {}",
                            engine_id, e
                        )));
                    }
                };
                tracing::warn!(engine = %engine_id, error = %e, "synthesis failed, falling back to piper");
                engine = Arc::clone(piper);
                engine_id = EngineId::Piper;
                engine.synthesize(text, &request.voice).await.map_err(|e| {
                    SynthesisError::failed(format!("fallback synthesis failed: {}", e))
                })?
            }
        };
        let duration_ms = started.elapsed().as_millis() as u64;

        if let Err(e) = self
            .cache
            .put(engine_id.as_str(), &request.voice, text, &audio)
            .await
        {
            tracing::warn!(engine = %engine_id, error = %e, "cache write failed, continuing");
        }

        let audio_ms = self
            .transcoder
            .audio_info(&audio)
            .map(|info| info.duration_ms)
            .unwrap_or(0);
        tracing::info!(
            engine = %engine_id,
            duration_ms,
            audio_ms,
            audio_bytes = audio.len(),
            "synthesis complete"
        );

        Ok(self
            .finish(audio, engine_id, false, duration_ms, request.output_format)
            .await)
    }

    /// 引擎选择策略
    ///
    /// - 显式指定：未配置 / 不可用 -> invalid-argument
    /// - auto：Parkiet 可用则优先，否则 Piper
    /// - 两者都未配置 -> service-unavailable
    fn select_engine(
        &self,
        selector: EngineSelector,
    ) -> Result<Arc<dyn SpeechEnginePort>, SynthesisError> {
        match selector {
            EngineSelector::Piper => self
                .piper
                .clone()
                .ok_or_else(|| SynthesisError::invalid("piper engine is not enabled")),
            EngineSelector::Parkiet => match &self.parkiet {
                Some(parkiet) if parkiet.is_available() => Ok(Arc::clone(parkiet)),
                _ => Err(SynthesisError::invalid("parkiet engine is not available")),
            },
            EngineSelector::Auto => {
                if let Some(parkiet) = &self.parkiet {
                    if parkiet.is_available() {
                        return Ok(Arc::clone(parkiet));
                    }
                }
                self.piper
                    .clone()
                    .ok_or_else(|| SynthesisError::unavailable("no TTS engine available"))
            }
        }
    }

    /// 收尾：按需转码
    ///
    /// 转码失败不影响请求结果，降级返回原生 WAV。
    async fn finish(
        &self,
        audio: Vec<u8>,
        engine_used: EngineId,
        cached: bool,
        duration_ms: u64,
        requested_format: AudioFormat,
    ) -> SynthesisResult {
        let (audio, format) = if requested_format == AudioFormat::Wav {
            (audio, AudioFormat::Wav)
        } else {
            match self.transcoder.transcode(&audio, requested_format).await {
                Ok(converted) => (converted, requested_format),
                Err(e) => {
                    tracing::warn!(
                        format = %requested_format,
                        error = %e,
                        "post-conversion failed, returning native wav"
                    );
                    (audio, AudioFormat::Wav)
                }
            }
        };

        SynthesisResult {
            audio,
            engine_used,
            cached,
            duration_ms,
            format,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{CacheError, TranscodeError};
    use crate::infrastructure::adapters::engines::FakeEngine;
    use crate::infrastructure::persistence::fs::{FsAudioCache, FsCacheConfig};
    use async_trait::async_trait;
    use tempfile::tempdir;

    /// 测试转码器：Wav 直通，Mp3 可配置失败
    struct TestTranscoder {
        fail_mp3: bool,
    }

    #[async_trait]
    impl AudioTranscoderPort for TestTranscoder {
        async fn transcode(
            &self,
            wav_data: &[u8],
            format: AudioFormat,
        ) -> Result<Vec<u8>, TranscodeError> {
            match format {
                AudioFormat::Wav => Ok(wav_data.to_vec()),
                AudioFormat::Mp3 if self.fail_mp3 => {
                    Err(TranscodeError::EncodingError("ffmpeg missing".into()))
                }
                AudioFormat::Mp3 => Ok(b"mp3-data".to_vec()),
            }
        }

        fn audio_info(
            &self,
            _wav_data: &[u8],
        ) -> Result<crate::application::ports::AudioInfo, TranscodeError> {
            Err(TranscodeError::InvalidInput("not implemented".into()))
        }
    }

    /// 始终报错的缓存，验证缓存故障不影响请求
    struct BrokenCache;

    #[async_trait]
    impl AudioCachePort for BrokenCache {
        async fn get(
            &self,
            _engine_id: &str,
            _voice: &str,
            _text: &str,
        ) -> Result<Option<Vec<u8>>, CacheError> {
            Err(CacheError::IoError("disk on fire".into()))
        }

        async fn put(
            &self,
            _engine_id: &str,
            _voice: &str,
            _text: &str,
            _audio: &[u8],
        ) -> Result<(), CacheError> {
            Err(CacheError::IoError("disk on fire".into()))
        }
    }

    fn fs_cache(dir: &std::path::Path) -> Arc<dyn AudioCachePort> {
        Arc::new(
            FsAudioCache::new(FsCacheConfig {
                root_dir: dir.to_path_buf(),
                ttl_days: 7,
            })
            .unwrap(),
        )
    }

    fn orchestrator(
        piper: Option<Arc<FakeEngine>>,
        parkiet: Option<Arc<FakeEngine>>,
        cache: Arc<dyn AudioCachePort>,
    ) -> TtsOrchestrator {
        TtsOrchestrator::new(
            piper.map(|e| e as Arc<dyn SpeechEnginePort>),
            parkiet.map(|e| e as Arc<dyn SpeechEnginePort>),
            cache,
            Arc::new(TestTranscoder { fail_mp3: false }),
            EngineId::Piper,
        )
    }

    #[tokio::test]
    async fn test_auto_selects_piper_when_parkiet_unavailable() {
        let dir = tempdir().unwrap();
        let piper = Arc::new(FakeEngine::piper());
        let parkiet = Arc::new(FakeEngine::parkiet().unavailable());
        let orch = orchestrator(Some(piper), Some(parkiet), fs_cache(dir.path()));

        let result = orch
            .synthesize(SynthesisRequest::new("Bel 0612345678 nu"))
            .await
            .unwrap();

        assert_eq!(result.engine_used, EngineId::Piper);
        assert!(!result.cached);
    }

    #[tokio::test]
    async fn test_second_identical_request_hits_cache() {
        let dir = tempdir().unwrap();
        let piper = Arc::new(FakeEngine::piper());
        let orch = orchestrator(Some(piper.clone()), None, fs_cache(dir.path()));

        let first = orch
            .synthesize(SynthesisRequest::new("Bel 0612345678 nu"))
            .await
            .unwrap();
        assert!(!first.cached);

        let second = orch
            .synthesize(SynthesisRequest::new("Bel 0612345678 nu"))
            .await
            .unwrap();
        assert!(second.cached);
        assert_eq!(second.duration_ms, 0);
        assert_eq!(second.audio, first.audio);
        // 缓存命中不调用引擎
        assert_eq!(piper.call_count(), 1);
    }

    #[tokio::test]
    async fn test_fallback_to_piper_on_parkiet_failure() {
        let dir = tempdir().unwrap();
        let piper = Arc::new(FakeEngine::piper());
        let parkiet = Arc::new(FakeEngine::parkiet().failing());
        let orch = orchestrator(Some(piper), Some(parkiet.clone()), fs_cache(dir.path()));

        let result = orch
            .synthesize(SynthesisRequest::new("hallo wereld"))
            .await
            .unwrap();

        assert_eq!(result.engine_used, EngineId::Piper);
        assert_eq!(parkiet.call_count(), 1);
    }

    #[tokio::test]
    async fn test_no_fallback_loop_when_piper_fails() {
        let dir = tempdir().unwrap();
        let piper = Arc::new(FakeEngine::piper().failing());
        let orch = orchestrator(Some(piper.clone()), None, fs_cache(dir.path()));

        let err = orch
            .synthesize(SynthesisRequest::new("hallo wereld"))
            .await
            .unwrap_err();

        assert!(matches!(err, SynthesisError::SynthesisFailed(_)));
        // 恰好一次调用，无重试循环
        assert_eq!(piper.call_count(), 1);
    }

    #[tokio::test]
    async fn test_both_engines_failing_reports_fallback_failure() {
        let dir = tempdir().unwrap();
        let piper = Arc::new(FakeEngine::piper().failing());
        let parkiet = Arc::new(FakeEngine::parkiet().failing());
        let orch = orchestrator(
            Some(piper.clone()),
            Some(parkiet.clone()),
            fs_cache(dir.path()),
        );

        let err = orch
            .synthesize(SynthesisRequest::new("hallo wereld"))
            .await
            .unwrap_err();

        assert!(matches!(err, SynthesisError::SynthesisFailed(_)));
        assert_eq!(parkiet.call_count(), 1);
        assert_eq!(piper.call_count(), 1);
    }

    #[tokio::test]
    async fn test_explicit_unknown_engine_rejected() {
        assert!(matches!(
            "espeak".parse::<EngineSelector>().unwrap_err(),
            SynthesisError::InvalidArgument(_)
        ));
    }

    #[tokio::test]
    async fn test_explicit_parkiet_unavailable_is_invalid_argument() {
        let dir = tempdir().unwrap();
        let piper = Arc::new(FakeEngine::piper());
        let parkiet = Arc::new(FakeEngine::parkiet().unavailable());
        let orch = orchestrator(Some(piper), Some(parkiet), fs_cache(dir.path()));

        let err = orch
            .synthesize(SynthesisRequest::new("hallo").with_engine(EngineSelector::Parkiet))
            .await
            .unwrap_err();

        assert!(matches!(err, SynthesisError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_no_engines_configured_is_unavailable() {
        let dir = tempdir().unwrap();
        let orch = orchestrator(None, None, fs_cache(dir.path()));

        let err = orch
            .synthesize(SynthesisRequest::new("hallo"))
            .await
            .unwrap_err();

        assert!(matches!(err, SynthesisError::ServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_empty_and_oversized_text_rejected() {
        let dir = tempdir().unwrap();
        let orch = orchestrator(Some(Arc::new(FakeEngine::piper())), None, fs_cache(dir.path()));

        let err = orch.synthesize(SynthesisRequest::new("   ")).await.unwrap_err();
        assert!(matches!(err, SynthesisError::InvalidArgument(_)));

        let long = "a".repeat(MAX_TEXT_CHARS + 1);
        let err = orch.synthesize(SynthesisRequest::new(long)).await.unwrap_err();
        assert!(matches!(err, SynthesisError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_broken_cache_is_soft_error() {
        let piper = Arc::new(FakeEngine::piper());
        let orch = orchestrator(Some(piper.clone()), None, Arc::new(BrokenCache));

        let result = orch
            .synthesize(SynthesisRequest::new("hallo wereld"))
            .await
            .unwrap();

        assert!(!result.cached);
        assert_eq!(result.engine_used, EngineId::Piper);
    }

    #[tokio::test]
    async fn test_transcode_failure_degrades_to_wav() {
        let dir = tempdir().unwrap();
        let piper = Arc::new(FakeEngine::piper());
        let orch = TtsOrchestrator::new(
            Some(piper as Arc<dyn SpeechEnginePort>),
            None,
            fs_cache(dir.path()),
            Arc::new(TestTranscoder { fail_mp3: true }),
            EngineId::Piper,
        );

        let result = orch
            .synthesize(SynthesisRequest::new("hallo").with_output_format(AudioFormat::Mp3))
            .await
            .unwrap();

        // 转码失败降级，请求仍然成功
        assert_eq!(result.format, AudioFormat::Wav);
    }

    #[tokio::test]
    async fn test_requested_mp3_is_transcoded() {
        let dir = tempdir().unwrap();
        let piper = Arc::new(FakeEngine::piper());
        let orch = orchestrator(Some(piper), None, fs_cache(dir.path()));

        let result = orch
            .synthesize(SynthesisRequest::new("hallo").with_output_format(AudioFormat::Mp3))
            .await
            .unwrap();

        assert_eq!(result.format, AudioFormat::Mp3);
        assert_eq!(result.audio, b"mp3-data");
    }

    #[tokio::test]
    async fn test_engine_listing_order_and_availability() {
        let dir = tempdir().unwrap();
        let piper = Arc::new(FakeEngine::piper());
        let parkiet = Arc::new(FakeEngine::parkiet().unavailable());
        let orch = orchestrator(Some(piper), Some(parkiet), fs_cache(dir.path()));

        let engines = orch.available_engines();
        assert_eq!(engines.len(), 2);
        assert_eq!(engines[0].id, EngineId::Piper);
        assert!(engines[0].available);
        assert_eq!(engines[1].id, EngineId::Parkiet);
        assert!(!engines[1].available);
    }
}

//! Parkiet Engine - 高质量荷兰语合成，GPU 优先，惰性加载
//!
//! 模型运行时是一个外部 worker 进程（加载模型进显存后通过
//! stdin/stdout 按 JSON-lines 协议服务）：
//!
//! - 启动后 worker 输出一行 `{"status":"ready"}`
//! - 请求：`{"text":"..."}`
//! - 响应：`{"sample_rate":N,"audio":"<base64 16-bit mono PCM>"}`
//!   或 `{"error":"..."}`
//!
//! 模型状态机 {Unloaded, Loading, Ready} 由同一把互斥锁守护：
//! 同一时刻至多一次合成（含惰性加载）在执行，并发请求在锁上排队
//! 而不是竞争加载两份模型。卸载同样走这把锁，保证不会在推理中途
//! 释放模型。

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;

use super::{pcm_to_wav, stderr_tail};
use crate::application::ports::{
    EngineDescriptor, EngineError, EngineId, EngineQuality, EngineSpeed, SpeechEnginePort,
};
use crate::domain::{normalize_for_parkiet, starts_with_speaker_tag};

/// 空闲卸载阈值默认值（秒）
pub const DEFAULT_IDLE_UNLOAD_SECS: u64 = 300;

/// Parkiet 引擎配置
#[derive(Debug, Clone)]
pub struct ParkietEngineConfig {
    /// worker 可执行文件
    pub worker_binary: String,
    /// worker 附加参数（`--model <id>` 之外）
    pub worker_args: Vec<String>,
    /// 模型标识
    pub model_id: String,
    /// 是否要求 GPU 存在才报告可用
    pub require_gpu: bool,
    /// 空闲卸载阈值（秒），由外部操作触发检查
    pub idle_unload_secs: u64,
    /// 单次加载 / 推理的超时（秒）
    pub request_timeout_secs: u64,
}

impl Default for ParkietEngineConfig {
    fn default() -> Self {
        Self {
            worker_binary: "parkiet-worker".to_string(),
            worker_args: Vec::new(),
            model_id: "pevers/parkiet".to_string(),
            require_gpu: true,
            idle_unload_secs: DEFAULT_IDLE_UNLOAD_SECS,
            request_timeout_secs: 120,
        }
    }
}

/// worker 启动 / 响应行
#[derive(Debug, Deserialize)]
struct WorkerLine {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    sample_rate: Option<u32>,
    #[serde(default)]
    audio: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct WorkerRequest<'a> {
    text: &'a str,
}

/// 运行中的 worker 进程句柄
struct WorkerHandle {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl WorkerHandle {
    /// 发送一次推理请求，返回 (sample_rate, pcm)
    async fn infer(&mut self, text: &str) -> Result<(u32, Vec<u8>), EngineError> {
        let request = serde_json::to_string(&WorkerRequest { text })
            .map_err(|e| EngineError::ProtocolError(e.to_string()))?;
        self.stdin.write_all(request.as_bytes()).await?;
        self.stdin.write_all(b"\n").await?;
        self.stdin.flush().await?;

        let mut line = String::new();
        let read = self.stdout.read_line(&mut line).await?;
        if read == 0 {
            return Err(EngineError::ProtocolError(
                "worker closed stdout".to_string(),
            ));
        }

        let response: WorkerLine = serde_json::from_str(line.trim())
            .map_err(|e| EngineError::ProtocolError(format!("bad worker response: {}", e)))?;
        if let Some(err) = response.error {
            return Err(EngineError::ProcessFailed(err));
        }

        let sample_rate = response
            .sample_rate
            .ok_or_else(|| EngineError::ProtocolError("missing sample_rate".to_string()))?;
        let pcm = BASE64
            .decode(response.audio.unwrap_or_default())
            .map_err(|e| EngineError::ProtocolError(format!("bad audio payload: {}", e)))?;

        Ok((sample_rate, pcm))
    }

    fn shutdown(mut self) {
        // kill_on_drop 兜底，这里主动发 kill
        let _ = self.child.start_kill();
    }
}

/// 模型状态机
enum ModelState {
    Unloaded,
    /// 加载进行中（持锁期间的瞬态；加载失败回到 Unloaded，下次调用重试）
    Loading,
    Ready(WorkerHandle),
}

struct EngineState {
    model: ModelState,
    last_used: Option<Instant>,
}

/// Parkiet 引擎
pub struct ParkietEngine {
    config: ParkietEngineConfig,
    state: Mutex<EngineState>,
}

impl ParkietEngine {
    pub fn new(config: ParkietEngineConfig) -> Self {
        tracing::info!(
            model = %config.model_id,
            require_gpu = config.require_gpu,
            "ParkietEngine configured (lazy load)"
        );
        Self {
            config,
            state: Mutex::new(EngineState {
                model: ModelState::Unloaded,
                last_used: None,
            }),
        }
    }

    /// 模型是否已加载（诊断用）
    pub async fn is_loaded(&self) -> bool {
        matches!(self.state.lock().await.model, ModelState::Ready(_))
    }

    /// 显式卸载模型，释放显存
    ///
    /// 走状态锁，绝不会在一次推理中途释放模型。
    pub async fn unload(&self) {
        let mut state = self.state.lock().await;
        if let ModelState::Ready(_) = state.model {
            tracing::info!(model = %self.config.model_id, "unloading parkiet model to free VRAM");
            if let ModelState::Ready(worker) = std::mem::replace(&mut state.model, ModelState::Unloaded)
            {
                worker.shutdown();
            }
        }
        state.last_used = None;
    }

    /// 空闲超过阈值时卸载（由操作信号 / 外部巡检触发，核心不带定时器）
    pub async fn unload_if_idle(&self) {
        let idle = {
            let state = self.state.lock().await;
            match (&state.model, state.last_used) {
                (ModelState::Ready(_), Some(last)) => {
                    last.elapsed() >= Duration::from_secs(self.config.idle_unload_secs)
                }
                _ => false,
            }
        };
        if idle {
            self.unload().await;
        }
    }

    /// 惰性加载：Unloaded -> Loading -> Ready，失败回到 Unloaded
    async fn ensure_loaded(&self, state: &mut EngineState) -> Result<(), EngineError> {
        if matches!(state.model, ModelState::Ready(_)) {
            return Ok(());
        }
        state.model = ModelState::Loading;

        tracing::info!(model = %self.config.model_id, "loading parkiet model...");
        match self.spawn_worker().await {
            Ok(worker) => {
                state.model = ModelState::Ready(worker);
                state.last_used = Some(Instant::now());
                tracing::info!(model = %self.config.model_id, "parkiet model loaded");
                Ok(())
            }
            Err(e) => {
                state.model = ModelState::Unloaded;
                tracing::error!(model = %self.config.model_id, error = %e, "parkiet model load failed");
                Err(e)
            }
        }
    }

    async fn spawn_worker(&self) -> Result<WorkerHandle, EngineError> {
        let mut child = Command::new(&self.config.worker_binary)
            .args(&self.config.worker_args)
            .arg("--model")
            .arg(&self.config.model_id)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                EngineError::ModelLoadFailed(format!(
                    "failed to spawn {}: {}",
                    self.config.worker_binary, e
                ))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| EngineError::ModelLoadFailed("worker stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EngineError::ModelLoadFailed("worker stdout unavailable".to_string()))?;
        let mut stdout = BufReader::new(stdout);

        // 等待就绪行；超时按加载失败处理
        let mut line = String::new();
        let read = tokio::time::timeout(
            Duration::from_secs(self.config.request_timeout_secs),
            stdout.read_line(&mut line),
        )
        .await
        .map_err(|_| EngineError::ModelLoadFailed("worker startup timed out".to_string()))?
        .map_err(|e| EngineError::ModelLoadFailed(e.to_string()))?;

        if read == 0 {
            // worker 在输出就绪行前退出，stderr 里有原因
            let output = child.wait_with_output().await?;
            return Err(EngineError::ModelLoadFailed(stderr_tail(
                &output.stderr,
                300,
            )));
        }

        let ready: WorkerLine = serde_json::from_str(line.trim())
            .map_err(|e| EngineError::ModelLoadFailed(format!("bad ready line: {}", e)))?;
        if let Some(err) = ready.error {
            return Err(EngineError::ModelLoadFailed(err));
        }
        if ready.status.as_deref() != Some("ready") {
            return Err(EngineError::ModelLoadFailed(format!(
                "unexpected ready line: {}",
                line.trim()
            )));
        }

        Ok(WorkerHandle {
            child,
            stdin,
            stdout,
        })
    }
}

#[async_trait]
impl SpeechEnginePort for ParkietEngine {
    async fn synthesize(&self, text: &str, _voice: &str) -> Result<Vec<u8>, EngineError> {
        // 整个合成（含惰性加载）持锁执行，串行化 GPU 访问
        let mut state = self.state.lock().await;
        self.ensure_loaded(&mut state).await?;

        // Parkiet 要求归一化输入并以说话人标签开头
        let mut text = normalize_for_parkiet(text);
        if !starts_with_speaker_tag(&text) {
            text = format!("[S1] {}", text);
        }
        let preview: String = text.chars().take(200).collect();
        tracing::debug!(input = %preview, "parkiet input");

        let ModelState::Ready(worker) = &mut state.model else {
            return Err(EngineError::ModelLoadFailed("model not loaded".to_string()));
        };

        let result = tokio::time::timeout(
            Duration::from_secs(self.config.request_timeout_secs),
            worker.infer(&text),
        )
        .await
        .unwrap_or_else(|_| {
            Err(EngineError::ProcessFailed(
                "parkiet inference timed out".to_string(),
            ))
        });

        match result {
            Ok((sample_rate, pcm)) => {
                state.last_used = Some(Instant::now());
                pcm_to_wav(&pcm, sample_rate)
            }
            Err(e) => {
                // worker 可能已退出或协议失步，重置为 Unloaded 让下次调用重载
                if let ModelState::Ready(worker) =
                    std::mem::replace(&mut state.model, ModelState::Unloaded)
                {
                    worker.shutdown();
                }
                Err(e)
            }
        }
    }

    fn is_available(&self) -> bool {
        // 廉价、无副作用的 GPU 探测
        !self.config.require_gpu || Path::new("/dev/nvidiactl").exists()
    }

    fn descriptor(&self) -> EngineDescriptor {
        EngineDescriptor {
            id: EngineId::Parkiet,
            quality: EngineQuality::High,
            speed: EngineSpeed::Slow,
        }
    }
}

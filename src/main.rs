//! Stemwerk - 荷兰语 TTS 编排服务
//!
//! 分层架构：
//! - Domain: 文本规范化、荷兰语数字转写
//! - Application: 编排器、端口定义
//! - Infrastructure: 引擎适配器（Piper / Parkiet）、文件系统缓存、FFmpeg 转码、HTTP

use std::sync::Arc;

use stemwerk::application::ports::{AudioCachePort, EngineId, SpeechEnginePort};
use stemwerk::application::TtsOrchestrator;
use stemwerk::config::{load_config, print_config};
use stemwerk::infrastructure::adapters::engines::{
    ParkietEngine, ParkietEngineConfig, PiperEngine, PiperEngineConfig,
};
use stemwerk::infrastructure::adapters::transcoder::{FfmpegTranscoder, FfmpegTranscoderConfig};
use stemwerk::infrastructure::http::{AppState, HttpServer, ServerConfig};
use stemwerk::infrastructure::persistence::fs::{FsAudioCache, FsCacheConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    // 初始化日志
    let log_filter = format!(
        "{},stemwerk={},tower_http=debug",
        config.log.level, config.log.level
    );
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));
    if config.log.json {
        tracing_subscriber::fmt().json().with_env_filter(env_filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    tracing::info!("Stemwerk - 荷兰语 TTS 编排服务");
    print_config(&config);

    // 创建引擎适配器
    let piper: Option<Arc<dyn SpeechEnginePort>> = if config.piper.enabled {
        Some(Arc::new(PiperEngine::new(PiperEngineConfig {
            binary_path: config.piper.binary_path.clone(),
            model_path: config.piper.model_path.clone(),
        })))
    } else {
        None
    };

    let parkiet_engine = if config.parkiet.enabled {
        Some(Arc::new(ParkietEngine::new(ParkietEngineConfig {
            worker_binary: config.parkiet.worker_binary.clone(),
            worker_args: config.parkiet.worker_args.clone(),
            model_id: config.parkiet.model_id.clone(),
            require_gpu: config.parkiet.require_gpu,
            idle_unload_secs: config.parkiet.idle_unload_secs,
            request_timeout_secs: config.parkiet.request_timeout_secs,
        })))
    } else {
        None
    };
    let parkiet: Option<Arc<dyn SpeechEnginePort>> = parkiet_engine
        .clone()
        .map(|e| e as Arc<dyn SpeechEnginePort>);

    // 创建文件系统音频缓存
    let cache: Arc<dyn AudioCachePort> = Arc::new(FsAudioCache::new(FsCacheConfig {
        root_dir: config.cache.dir.clone(),
        ttl_days: config.cache.ttl_days,
    })?);

    // 创建 FFmpeg 转码器
    let transcoder = Arc::new(FfmpegTranscoder::new(FfmpegTranscoderConfig {
        binary_path: config.transcoder.ffmpeg_binary.clone(),
        mp3_bitrate: config.transcoder.mp3_bitrate,
    }));

    // 默认引擎：优先 Piper（快、始终可用），否则 Parkiet
    let default_engine = if config.piper.enabled {
        EngineId::Piper
    } else {
        EngineId::Parkiet
    };

    let orchestrator = Arc::new(TtsOrchestrator::new(
        piper,
        parkiet,
        cache,
        transcoder,
        default_engine,
    ));

    // SIGUSR1 -> 空闲卸载检查（运维钩子，释放 GPU 显存）
    if let Some(engine) = parkiet_engine {
        tokio::spawn(async move {
            let mut sigusr1 = match tokio::signal::unix::signal(
                tokio::signal::unix::SignalKind::user_defined1(),
            ) {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to install SIGUSR1 handler");
                    return;
                }
            };
            while sigusr1.recv().await.is_some() {
                tracing::info!("Received SIGUSR1, checking idle unload");
                engine.unload_if_idle().await;
            }
        });
    }

    // 创建 HTTP 服务器
    let server_config = ServerConfig::new(&config.server.host, config.server.port);
    let state = AppState::new(orchestrator);
    let server = HttpServer::new(server_config, state);

    tracing::info!("Starting HTTP server...");

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => tracing::info!("Received shutdown signal"),
                Err(e) => tracing::error!(error = %e, "Failed to listen for ctrl-c"),
            }
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}

//! TTS Handlers
//!
//! - POST /api/tts/synthesize: 文本 -> 音频（来源信息在响应头里）
//! - GET  /api/tts/engines:    引擎列表 + 默认引擎

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use crate::application::SynthesisRequest;
use crate::infrastructure::http::dto::{EnginesResponseDto, SynthesizeRequestDto};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 合成音频
///
/// 响应体是音频字节；引擎来源 / 缓存命中 / 耗时通过
/// X-Engine-Used / X-Cached / X-Duration-Ms 头暴露。
pub async fn synthesize(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SynthesizeRequestDto>,
) -> Result<impl IntoResponse, ApiError> {
    let request = SynthesisRequest::new(req.text)
        .with_engine(req.engine)
        .with_voice(req.voice)
        .with_output_format(req.output_format);

    let result = state.orchestrator.synthesize(request).await?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(result.format.content_type()),
    );
    headers.insert(
        "X-Engine-Used",
        HeaderValue::from_static(result.engine_used.as_str()),
    );
    headers.insert(
        "X-Cached",
        HeaderValue::from_static(if result.cached { "true" } else { "false" }),
    );
    headers.insert(
        "X-Duration-Ms",
        HeaderValue::from_str(&result.duration_ms.to_string())
            .map_err(|e| ApiError::Internal(e.to_string()))?,
    );

    Ok((headers, result.audio))
}

/// 引擎列表
pub async fn engines(State(state): State<Arc<AppState>>) -> Json<EnginesResponseDto> {
    Json(EnginesResponseDto {
        engines: state.orchestrator.available_engines(),
        default: state.orchestrator.default_engine(),
    })
}

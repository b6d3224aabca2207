//! HTTP Routes
//!
//! API Endpoints:
//! - /api/tts/synthesize  POST  合成音频
//! - /api/tts/engines     GET   引擎列表
//! - /api/ping            GET   健康检查
//! - /health              GET   健康检查（容器探针用）

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/api", api_routes())
        .route("/health", get(handlers::ping))
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .nest("/tts", tts_routes())
}

/// TTS 路由
fn tts_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/synthesize", post(handlers::synthesize))
        .route("/engines", get(handlers::engines))
}

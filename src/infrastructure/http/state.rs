//! Application State

use std::sync::Arc;

use crate::application::TtsOrchestrator;

/// 应用状态
pub struct AppState {
    pub orchestrator: Arc<TtsOrchestrator>,
}

impl AppState {
    pub fn new(orchestrator: Arc<TtsOrchestrator>) -> Self {
        Self { orchestrator }
    }
}

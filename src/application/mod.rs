//! 应用层
//!
//! 端口定义 + 合成编排 + 错误分类

mod error;
mod orchestrator;
pub mod ports;

pub use error::SynthesisError;
pub use orchestrator::{
    EngineSelector, EngineStatus, SynthesisRequest, SynthesisResult, TtsOrchestrator,
    MAX_TEXT_CHARS,
};

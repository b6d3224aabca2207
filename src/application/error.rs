//! 应用层错误定义
//!
//! 合成请求的错误分类。缓存与转码失败不在此列：
//! 它们是软错误，只记录日志，请求继续。

use thiserror::Error;

/// 合成错误
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// 参数无效（未知/未启用引擎、空文本、超长文本、不支持的格式）
    /// 直接返回调用方，不重试
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// 没有任何引擎可以服务请求，调用方可稍后重试
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// 引擎合成失败且回退也失败（或无可回退引擎）
    #[error("Synthesis failed: {0}")]
    SynthesisFailed(String),
}

impl SynthesisError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::SynthesisFailed(message.into())
    }
}

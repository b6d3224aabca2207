//! Data Transfer Objects

use serde::{Deserialize, Serialize};

use crate::application::{EngineSelector, EngineStatus};
use crate::application::ports::{AudioFormat, EngineId};

/// 合成请求体
#[derive(Debug, Deserialize)]
pub struct SynthesizeRequestDto {
    pub text: String,
    #[serde(default)]
    pub engine: EngineSelector,
    #[serde(default = "default_voice")]
    pub voice: String,
    #[serde(default)]
    pub output_format: AudioFormat,
}

fn default_voice() -> String {
    "default".to_string()
}

/// /engines 响应
#[derive(Debug, Serialize)]
pub struct EnginesResponseDto {
    pub engines: Vec<EngineStatus>,
    pub default: EngineId,
}

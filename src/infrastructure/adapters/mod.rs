//! 基础设施适配器
//!
//! 应用层端口的具体实现

pub mod engines;
pub mod transcoder;

pub use engines::{FakeEngine, ParkietEngine, ParkietEngineConfig, PiperEngine, PiperEngineConfig};
pub use transcoder::{FfmpegTranscoder, FfmpegTranscoderConfig};

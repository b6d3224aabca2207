//! Application Ports
//!
//! 应用层端口定义，具体实现在 infrastructure 层

mod audio_cache;
mod audio_transcoder;
mod speech_engine;

pub use audio_cache::{generate_cache_key, AudioCachePort, CacheError};
pub use audio_transcoder::{
    AudioFormat, AudioInfo, AudioTranscoderPort, TranscodeError,
};
pub use speech_engine::{
    EngineDescriptor, EngineError, EngineId, EngineQuality, EngineSpeed, SpeechEnginePort,
};

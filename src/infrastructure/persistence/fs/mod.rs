//! 文件系统持久化

mod audio_cache;

pub use audio_cache::{FsAudioCache, FsCacheConfig};

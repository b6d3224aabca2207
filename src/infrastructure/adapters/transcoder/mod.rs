//! 音频转码适配器

mod ffmpeg_transcoder;

pub use ffmpeg_transcoder::{parse_wav_info, FfmpegTranscoder, FfmpegTranscoderConfig};

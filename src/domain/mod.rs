//! 领域层
//!
//! 纯文本处理逻辑，无 I/O 依赖

pub mod normalizer;
pub mod numerals;

pub use normalizer::{normalize_for_parkiet, starts_with_speaker_tag};

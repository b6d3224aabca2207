//! HTTP Handlers

mod ping;
mod tts;

pub use ping::ping;
pub use tts::{engines, synthesize};

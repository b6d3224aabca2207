//! Fake Engine - 测试用合成引擎
//!
//! 返回固定音频或固定失败，不调用任何外部进程。

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::application::ports::{
    EngineDescriptor, EngineError, EngineId, EngineQuality, EngineSpeed, SpeechEnginePort,
};

/// Fake 引擎
pub struct FakeEngine {
    descriptor: EngineDescriptor,
    available: bool,
    fail: bool,
    audio: Vec<u8>,
    calls: AtomicUsize,
}

impl FakeEngine {
    pub fn piper() -> Self {
        Self::new(EngineDescriptor {
            id: EngineId::Piper,
            quality: EngineQuality::Basic,
            speed: EngineSpeed::Fast,
        })
    }

    pub fn parkiet() -> Self {
        Self::new(EngineDescriptor {
            id: EngineId::Parkiet,
            quality: EngineQuality::High,
            speed: EngineSpeed::Slow,
        })
    }

    fn new(descriptor: EngineDescriptor) -> Self {
        Self {
            descriptor,
            available: true,
            fail: false,
            audio: format!("RIFF-fake-{}", descriptor.id).into_bytes(),
            calls: AtomicUsize::new(0),
        }
    }

    /// 合成调用一律失败
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// 报告不可用
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// synthesize 被调用的次数
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechEnginePort for FakeEngine {
    async fn synthesize(&self, _text: &str, _voice: &str) -> Result<Vec<u8>, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(EngineError::ProcessFailed(format!(
                "{} is scripted to fail",
                self.descriptor.id
            )));
        }
        Ok(self.audio.clone())
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn descriptor(&self) -> EngineDescriptor {
        self.descriptor
    }
}

//! Audio Cache Port - 音频缓存管理
//!
//! 定义内容寻址音频缓存的抽象接口，具体实现使用文件系统
//! （指纹分桶目录 + mtime TTL 过期）。

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

/// Audio Cache 错误
///
/// 对编排器而言缓存错误是软错误：记录日志后按缓存未命中处理，
/// 绝不使请求失败。
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("IO error: {0}")]
    IoError(String),
}

impl From<std::io::Error> for CacheError {
    fn from(e: std::io::Error) -> Self {
        CacheError::IoError(e.to_string())
    }
}

/// 生成缓存指纹
///
/// (engine_id, voice, 归一化文本) 的纯函数：
/// - 文本先做 Unicode NFC 归一化、trim、小写，
///   保证大小写 / 首尾空白差异命中同一条目
/// - 三个字段按长度前缀喂入 SHA-256，杜绝字段边界碰撞
/// - 输出 64 字符 hex
pub fn generate_cache_key(engine_id: &str, voice: &str, text: &str) -> String {
    let normalized: String = text.trim().nfc().collect::<String>().to_lowercase();

    let mut hasher = Sha256::new();
    for field in [engine_id, voice, normalized.as_str()] {
        hasher.update((field.len() as u64).to_le_bytes());
        hasher.update(field.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Audio Cache Port
///
/// 条目的存在本身即是「相同 (engine, voice, text) 曾合成过」的证明，
/// 除音频字节与 mtime 外不存任何元数据。
#[async_trait]
pub trait AudioCachePort: Send + Sync {
    /// 查询缓存
    ///
    /// 条目存在但超过 TTL 时删除并返回 None（惰性过期）。
    async fn get(
        &self,
        engine_id: &str,
        voice: &str,
        text: &str,
    ) -> Result<Option<Vec<u8>>, CacheError>;

    /// 写入缓存（覆盖已有条目，幂等）
    async fn put(
        &self,
        engine_id: &str,
        voice: &str,
        text: &str,
        audio: &[u8],
    ) -> Result<(), CacheError>;
}

//! 文件系统音频缓存实现
//!
//! 内容寻址：条目路径 = `<root>/<指纹前 2 位 hex>/<完整指纹>.wav`，
//! 两位分桶目录限制单目录扇出。过期是惰性的：查询时检查 mtime，
//! 超过 TTL 就删除并按未命中处理，没有后台清扫。
//!
//! 并发语义：同一指纹的并发读写都是文件系统操作，两次相同请求
//! 同时未命中会各写一次相同字节（最后写入胜出，内容一致，无害）；
//! 并发的过期删除最多造成一次多余的 unlink，不构成正确性问题。

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use crate::application::ports::{generate_cache_key, AudioCachePort, CacheError};

/// 文件缓存配置
#[derive(Debug, Clone)]
pub struct FsCacheConfig {
    /// 缓存根目录
    pub root_dir: PathBuf,
    /// 过期时间（天）
    pub ttl_days: u64,
}

impl Default for FsCacheConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("data/tts-cache"),
            ttl_days: 7,
        }
    }
}

/// 文件系统音频缓存
pub struct FsAudioCache {
    root: PathBuf,
    ttl: Duration,
}

impl FsAudioCache {
    pub fn new(config: FsCacheConfig) -> Result<Self, CacheError> {
        std::fs::create_dir_all(&config.root_dir)?;
        tracing::info!(
            root = %config.root_dir.display(),
            ttl_days = config.ttl_days,
            "FsAudioCache initialized"
        );
        Ok(Self {
            root: config.root_dir,
            ttl: Duration::from_secs(config.ttl_days * 86_400),
        })
    }

    /// 条目路径：两位 hex 分桶 + 完整指纹文件名
    fn entry_path(&self, key: &str) -> PathBuf {
        self.root.join(&key[..2]).join(format!("{}.wav", key))
    }
}

#[async_trait]
impl AudioCachePort for FsAudioCache {
    async fn get(
        &self,
        engine_id: &str,
        voice: &str,
        text: &str,
    ) -> Result<Option<Vec<u8>>, CacheError> {
        let key = generate_cache_key(engine_id, voice, text);
        let path = self.entry_path(&key);

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let age = metadata
            .modified()
            .ok()
            .and_then(|mtime| SystemTime::now().duration_since(mtime).ok())
            .unwrap_or_default();
        if age > self.ttl {
            // 惰性过期；并发删除同一条目时 NotFound 是无害竞争
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
            tracing::debug!(key = %&key[..12], "cache entry expired");
            return Ok(None);
        }

        match tokio::fs::read(&path).await {
            Ok(audio) => {
                tracing::debug!(key = %&key[..12], bytes = audio.len(), "cache hit");
                Ok(Some(audio))
            }
            // metadata 与 read 之间条目被并发删除
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(
        &self,
        engine_id: &str,
        voice: &str,
        text: &str,
        audio: &[u8],
    ) -> Result<(), CacheError> {
        let key = generate_cache_key(engine_id, voice, text);
        let path = self.entry_path(&key);

        if let Some(bucket) = path.parent() {
            tokio::fs::create_dir_all(bucket).await?;
        }
        tokio::fs::write(&path, audio).await?;
        tracing::debug!(key = %&key[..12], bytes = audio.len(), "cache stored");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn cache(dir: &std::path::Path, ttl_days: u64) -> FsAudioCache {
        FsAudioCache::new(FsCacheConfig {
            root_dir: dir.to_path_buf(),
            ttl_days,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_roundtrip() {
        let dir = tempdir().unwrap();
        let cache = cache(dir.path(), 7);

        let audio = vec![1u8, 2, 3, 4, 5];
        cache.put("piper", "default", "hallo", &audio).await.unwrap();

        let got = cache.get("piper", "default", "hallo").await.unwrap();
        assert_eq!(got, Some(audio));
    }

    #[tokio::test]
    async fn test_miss_for_unknown_entry() {
        let dir = tempdir().unwrap();
        let cache = cache(dir.path(), 7);
        assert!(cache.get("piper", "default", "nooit gezien").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_normalized_text_hits_same_entry() {
        let dir = tempdir().unwrap();
        let cache = cache(dir.path(), 7);

        cache.put("piper", "default", "hello", b"xyz").await.unwrap();
        let got = cache.get("piper", "default", " Hello ").await.unwrap();
        assert_eq!(got, Some(b"xyz".to_vec()));
    }

    #[tokio::test]
    async fn test_put_overwrites_existing_entry() {
        let dir = tempdir().unwrap();
        let cache = cache(dir.path(), 7);

        cache.put("piper", "default", "hallo", b"oud").await.unwrap();
        cache.put("piper", "default", "hallo", b"nieuw").await.unwrap();

        let got = cache.get("piper", "default", "hallo").await.unwrap();
        assert_eq!(got, Some(b"nieuw".to_vec()));
    }

    #[tokio::test]
    async fn test_sharded_layout() {
        let dir = tempdir().unwrap();
        let cache = cache(dir.path(), 7);

        cache.put("piper", "default", "hallo", b"x").await.unwrap();

        let key = generate_cache_key("piper", "default", "hallo");
        let expected = dir.path().join(&key[..2]).join(format!("{}.wav", key));
        assert!(expected.exists());
    }

    #[tokio::test]
    async fn test_expired_entry_removed_and_absent() {
        let dir = tempdir().unwrap();
        let cache = cache(dir.path(), 1);

        cache.put("piper", "default", "hallo", b"x").await.unwrap();

        // 把 mtime 回拨到 TTL 之外（模拟时钟流逝）
        let key = generate_cache_key("piper", "default", "hallo");
        let path = dir.path().join(&key[..2]).join(format!("{}.wav", key));
        let old = SystemTime::now() - Duration::from_secs(2 * 86_400);
        let file = std::fs::OpenOptions::new().write(true).open(&path).unwrap();
        file.set_modified(old).unwrap();
        drop(file);

        assert!(cache.get("piper", "default", "hallo").await.unwrap().is_none());
        // 过期条目被删除
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_engines_do_not_share_entries() {
        let dir = tempdir().unwrap();
        let cache = cache(dir.path(), 7);

        cache.put("piper", "default", "hallo", b"piper-audio").await.unwrap();
        assert!(cache.get("parkiet", "default", "hallo").await.unwrap().is_none());
    }
}

use super::{CacheError, CacheObject, CacheStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use moka::future::Cache;
use std::sync::Arc;

struct StoredAudio {
    bytes: Vec<u8>,
    created_at: DateTime<Utc>,
}

/// In-process cache store bounded by total audio bytes
pub struct MemoryCacheStore {
    cache: Cache<String, Arc<StoredAudio>>,
}

impl MemoryCacheStore {
    pub fn new(max_bytes: u64) -> Self {
        let cache = Cache::builder()
            .weigher(|_name: &String, audio: &Arc<StoredAudio>| -> u32 {
                audio.bytes.len().try_into().unwrap_or(u32::MAX)
            })
            .max_capacity(max_bytes)
            .build();

        Self { cache }
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn read(&self, name: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(self.cache.get(name).await.map(|audio| audio.bytes.clone()))
    }

    async fn write(&self, name: &str, bytes: &[u8]) -> Result<(), CacheError> {
        let audio = Arc::new(StoredAudio {
            bytes: bytes.to_vec(),
            created_at: Utc::now(),
        });
        self.cache.insert(name.to_string(), audio).await;
        Ok(())
    }

    async fn remove(&self, name: &str) -> Result<bool, CacheError> {
        Ok(self.cache.remove(name).await.is_some())
    }

    async fn list(&self) -> Result<Vec<CacheObject>, CacheError> {
        Ok(self
            .cache
            .iter()
            .map(|(name, audio)| CacheObject {
                name: name.as_ref().clone(),
                size: audio.bytes.len() as u64,
                created_at: audio.created_at,
            })
            .collect())
    }
}

pub mod fs_store;
pub mod memory_store;

pub use fs_store::FsCacheStore;
pub use memory_store::MemoryCacheStore;

use crate::domain::tts::AudioFormat;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;

const NAME_PREFIX: &str = "audio-";

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cache backend error: {0}")]
    Backend(String),
}

/// Content address of one synthesized clip.
///
/// The hash covers every synthesis parameter, so two requests share an entry
/// only if they would produce the same audio.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    owner_id: String,
    hash: String,
    format: AudioFormat,
}

impl CacheKey {
    pub fn new(owner_id: &str, content: &str, voice: &str, speed: f32, format: AudioFormat) -> Self {
        let owner_id = sanitize_owner(owner_id);
        let speed = format!("{:.3}", speed);

        let mut hasher = Sha256::new();
        for field in [owner_id.as_str(), content, voice, speed.as_str(), format.as_str()] {
            // Length prefix keeps ("ab", "c") and ("a", "bc") apart
            hasher.update((field.len() as u64).to_le_bytes());
            hasher.update(field.as_bytes());
        }

        Self {
            owner_id,
            hash: hex::encode(hasher.finalize()),
            format,
        }
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    /// `audio-{owner_id}-{hash}.{ext}`
    pub fn object_name(&self) -> String {
        format!(
            "{}{}-{}.{}",
            NAME_PREFIX,
            self.owner_id,
            self.hash,
            self.format.as_str()
        )
    }

    /// Recover the key from an object name produced by [`CacheKey::object_name`]
    pub fn parse(name: &str) -> Option<Self> {
        let rest = name.strip_prefix(NAME_PREFIX)?;
        let (stem, ext) = rest.rsplit_once('.')?;
        let (owner_id, hash) = stem.rsplit_once('-')?;
        let format = AudioFormat::from_extension(ext)?;

        let is_hash = hash.len() == 64 && hash.bytes().all(|b| b.is_ascii_hexdigit());
        if owner_id.is_empty() || !is_hash {
            return None;
        }

        Some(Self {
            owner_id: owner_id.to_string(),
            hash: hash.to_string(),
            format,
        })
    }
}

/// Owner ids become part of a file name, so only `[A-Za-z0-9_-]` survive
pub fn sanitize_owner(owner_id: &str) -> String {
    let cleaned: String = owner_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned
    }
}

/// A stored blob as seen by a listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheObject {
    pub name: String,
    pub size: u64,
    pub created_at: DateTime<Utc>,
}

/// Key-value backend behind the audio cache.
///
/// `write` must be atomic: a concurrent `read` of the same name observes either
/// the previous complete value or the new complete value.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn read(&self, name: &str) -> Result<Option<Vec<u8>>, CacheError>;

    async fn write(&self, name: &str, bytes: &[u8]) -> Result<(), CacheError>;

    /// Returns whether an object was removed
    async fn remove(&self, name: &str) -> Result<bool, CacheError>;

    async fn list(&self) -> Result<Vec<CacheObject>, CacheError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub count: u64,
    pub total_bytes: u64,
}

/// Content-addressed store for synthesized audio
pub struct AudioCache {
    store: Arc<dyn CacheStore>,
}

impl AudioCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, CacheError> {
        self.store.read(&key.object_name()).await
    }

    pub async fn set(&self, key: &CacheKey, audio: &[u8]) -> Result<(), CacheError> {
        self.store.write(&key.object_name(), audio).await
    }

    /// Remove every entry of one owner, or the whole cache when `owner_id` is `None`.
    ///
    /// Returns the number of entries removed.
    pub async fn clear(&self, owner_id: Option<&str>) -> Result<usize, CacheError> {
        let owner_id = owner_id.map(sanitize_owner);
        let mut removed = 0;

        for object in self.store.list().await? {
            let belongs = match (&owner_id, CacheKey::parse(&object.name)) {
                (None, _) => true,
                (Some(owner), Some(key)) => key.owner_id == *owner,
                (Some(_), None) => false,
            };
            if belongs && self.store.remove(&object.name).await? {
                removed += 1;
            }
        }

        tracing::info!(owner_id = ?owner_id, removed, "Audio cache cleared");
        Ok(removed)
    }

    pub async fn stats(&self) -> Result<CacheStats, CacheError> {
        let objects = self.store.list().await?;
        Ok(CacheStats {
            count: objects.len() as u64,
            total_bytes: objects.iter().map(|o| o.size).sum(),
        })
    }

    /// Every entry with its parsed key, from a single listing. Foreign objects are skipped.
    pub async fn entries(&self) -> Result<Vec<(CacheKey, CacheObject)>, CacheError> {
        Ok(self
            .store
            .list()
            .await?
            .into_iter()
            .filter_map(|o| CacheKey::parse(&o.name).map(|key| (key, o)))
            .collect())
    }

    pub async fn remove(&self, key: &CacheKey) -> Result<bool, CacheError> {
        self.store.remove(&key.object_name()).await
    }
}

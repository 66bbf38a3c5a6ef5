use super::{CacheError, CacheObject, CacheStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

const TEMP_SUFFIX: &str = ".tmp";

/// Cache objects as flat files under one directory
pub struct FsCacheStore {
    root: PathBuf,
}

impl FsCacheStore {
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        tracing::info!(root = %root.display(), "Filesystem audio cache ready");
        Ok(Self { root })
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, CacheError> {
        if name.is_empty() || name.starts_with('.') || name.contains(['/', '\\']) {
            return Err(CacheError::Backend(format!("invalid object name: {}", name)));
        }
        Ok(self.root.join(name))
    }
}

#[async_trait]
impl CacheStore for FsCacheStore {
    async fn read(&self, name: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let path = self.path_for(name)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, name: &str, bytes: &[u8]) -> Result<(), CacheError> {
        let path = self.path_for(name)?;
        // Unique per writer so concurrent writes of one name never share a temp file
        let temp_path = self
            .root
            .join(format!(".{}.{}{}", name, Uuid::new_v4(), TEMP_SUFFIX));

        let written = async {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(bytes).await?;
            file.sync_all().await?;
            fs::rename(&temp_path, &path).await
        }
        .await;

        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn remove(&self, name: &str) -> Result<bool, CacheError> {
        let path = self.path_for(name)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self) -> Result<Vec<CacheObject>, CacheError> {
        let mut objects = Vec::new();
        let mut entries = fs::read_dir(&self.root).await?;

        while let Some(entry) = entries.next_entry().await? {
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if name.starts_with('.') {
                continue;
            }

            // Removed between read_dir and metadata
            let metadata = match entry.metadata().await {
                Ok(m) => m,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            if !metadata.is_file() {
                continue;
            }

            let created = metadata.created().or_else(|_| metadata.modified())?;
            objects.push(CacheObject {
                name,
                size: metadata.len(),
                created_at: DateTime::<Utc>::from(created),
            });
        }

        Ok(objects)
    }
}

use super::ArtifactOwnership;
use crate::domain::user::Caller;
use crate::infrastructure::cache::{AudioCache, CacheError, CacheKey};
use crate::infrastructure::repositories::{ArtifactRepository, ArtifactStoreError};
use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum ArtifactServiceError {
    #[error(transparent)]
    Store(#[from] ArtifactStoreError),
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error("artifact {0} belongs to a different kind of owner")]
    OwnerConflict(Uuid),
}

pub struct ArtifactService {
    artifacts: Arc<dyn ArtifactRepository>,
    cache: Arc<AudioCache>,
    retention: Duration,
}

impl ArtifactService {
    pub fn new(
        artifacts: Arc<dyn ArtifactRepository>,
        cache: Arc<AudioCache>,
        retention: Duration,
    ) -> Self {
        Self {
            artifacts,
            cache,
            retention,
        }
    }

    /// Make sure the caller's artifact exists before any audio is cached under it.
    ///
    /// Users get an owned artifact keyed by their user id, guests a temporary
    /// one keyed by their guest id. The stored record must match the caller's
    /// kind: a guest id naming an owned artifact is refused, and a temporary
    /// record squatting a user id is deleted and replaced by the user's own.
    pub async fn register_for(
        &self,
        caller: &Caller,
    ) -> Result<Option<ArtifactOwnership>, ArtifactServiceError> {
        let now = Utc::now();
        let artifact = match (caller.user_id, caller.guest_id) {
            (Some(user_id), _) => ArtifactOwnership::owned(user_id, now),
            (None, Some(guest_id)) => ArtifactOwnership::temporary(guest_id, now, self.retention),
            (None, None) => return Ok(None),
        };
        let wanted_temporary = artifact.is_temporary;

        let stored = self.artifacts.register(artifact.clone()).await?;
        if stored.is_temporary == wanted_temporary {
            return Ok(Some(stored));
        }

        if wanted_temporary {
            tracing::warn!(artifact_id = %stored.id, "Guest id collides with an owned artifact");
            return Err(ArtifactServiceError::OwnerConflict(stored.id));
        }

        tracing::warn!(
            artifact_id = %stored.id,
            "Temporary artifact held a user id, reclaiming it for the user"
        );
        self.delete_artifact(&stored).await?;

        let reclaimed = self.artifacts.register(artifact).await?;
        if reclaimed.is_temporary {
            return Err(ArtifactServiceError::OwnerConflict(reclaimed.id));
        }
        Ok(Some(reclaimed))
    }

    /// Delete an artifact together with its cached audio.
    ///
    /// Cache entries go first. If that fails the metadata stays, so the next
    /// sweep still knows the artifact and retries.
    pub async fn delete_artifact(
        &self,
        artifact: &ArtifactOwnership,
    ) -> Result<bool, ArtifactServiceError> {
        let removed_entries = self.cache.clear(Some(&artifact.cache_owner())).await?;
        self.delete_metadata(artifact, removed_entries).await
    }

    /// Like [`ArtifactService::delete_artifact`], with the cache entries
    /// already located by the caller from a single listing.
    pub async fn delete_artifact_entries(
        &self,
        artifact: &ArtifactOwnership,
        entries: &[CacheKey],
    ) -> Result<bool, ArtifactServiceError> {
        let mut removed_entries = 0;
        for key in entries {
            if self.cache.remove(key).await? {
                removed_entries += 1;
            }
        }
        self.delete_metadata(artifact, removed_entries).await
    }

    async fn delete_metadata(
        &self,
        artifact: &ArtifactOwnership,
        removed_entries: usize,
    ) -> Result<bool, ArtifactServiceError> {
        let deleted = self.artifacts.delete(artifact.id).await?;

        tracing::info!(
            artifact_id = %artifact.id,
            is_temporary = artifact.is_temporary,
            removed_entries,
            deleted,
            "Artifact deleted"
        );
        Ok(deleted)
    }
}

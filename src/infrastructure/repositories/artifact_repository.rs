use crate::domain::artifact::ArtifactOwnership;
use crate::infrastructure::db::DbPool;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum ArtifactStoreError {
    #[error("artifact store error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Ownership metadata of audio artifacts
#[async_trait]
pub trait ArtifactRepository: Send + Sync {
    async fn find(&self, id: Uuid) -> Result<Option<ArtifactOwnership>, ArtifactStoreError>;

    /// Owning user of the artifact. `None` for guest artifacts and unknown ids.
    async fn owner_of(&self, id: Uuid) -> Result<Option<Uuid>, ArtifactStoreError> {
        Ok(self.find(id).await?.and_then(|a| a.owner_id))
    }

    async fn is_temporary(&self, id: Uuid) -> Result<bool, ArtifactStoreError> {
        Ok(self.find(id).await?.is_some_and(|a| a.is_temporary))
    }

    /// Insert the record unless one with the same id exists, and return the stored record.
    ///
    /// Re-registering never moves `created_at`, so a guest cannot extend retention
    /// by synthesizing again.
    async fn register(
        &self,
        artifact: ArtifactOwnership,
    ) -> Result<ArtifactOwnership, ArtifactStoreError>;

    /// Temporary artifacts whose retention deadline is at or before `now`,
    /// earliest deadline first
    async fn find_expired_temporary(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ArtifactOwnership>, ArtifactStoreError>;

    /// Returns whether a record was deleted
    async fn delete(&self, id: Uuid) -> Result<bool, ArtifactStoreError>;

    async fn ping(&self) -> Result<(), ArtifactStoreError>;
}

pub struct PgArtifactRepository {
    pool: Arc<DbPool>,
}

impl PgArtifactRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ArtifactRepository for PgArtifactRepository {
    async fn find(&self, id: Uuid) -> Result<Option<ArtifactOwnership>, ArtifactStoreError> {
        let pool = self.pool.as_ref();
        let artifact = sqlx::query_as::<_, ArtifactOwnership>(
            r#"
            SELECT id, owner_id, is_temporary, created_at, retention_deadline
            FROM audio_artifacts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(artifact)
    }

    async fn register(
        &self,
        artifact: ArtifactOwnership,
    ) -> Result<ArtifactOwnership, ArtifactStoreError> {
        let pool = self.pool.as_ref();
        sqlx::query(
            r#"
            INSERT INTO audio_artifacts (id, owner_id, is_temporary, created_at, retention_deadline)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(artifact.id)
        .bind(artifact.owner_id)
        .bind(artifact.is_temporary)
        .bind(artifact.created_at)
        .bind(artifact.retention_deadline)
        .execute(pool)
        .await?;

        let stored = sqlx::query_as::<_, ArtifactOwnership>(
            r#"
            SELECT id, owner_id, is_temporary, created_at, retention_deadline
            FROM audio_artifacts
            WHERE id = $1
            "#,
        )
        .bind(artifact.id)
        .fetch_one(pool)
        .await?;

        Ok(stored)
    }

    async fn find_expired_temporary(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ArtifactOwnership>, ArtifactStoreError> {
        let pool = self.pool.as_ref();
        let artifacts = sqlx::query_as::<_, ArtifactOwnership>(
            r#"
            SELECT id, owner_id, is_temporary, created_at, retention_deadline
            FROM audio_artifacts
            WHERE is_temporary AND retention_deadline <= $1
            ORDER BY retention_deadline ASC
            LIMIT $2
            "#,
        )
        .bind(now)
        .bind(limit as i64)
        .fetch_all(pool)
        .await?;

        Ok(artifacts)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ArtifactStoreError> {
        let pool = self.pool.as_ref();
        let result = sqlx::query(
            r#"
            DELETE FROM audio_artifacts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), ArtifactStoreError> {
        sqlx::query("SELECT 1").fetch_one(self.pool.as_ref()).await?;
        Ok(())
    }
}

/// Process-local artifact store, used when no database is configured
#[derive(Default)]
pub struct InMemoryArtifactRepository {
    artifacts: RwLock<HashMap<Uuid, ArtifactOwnership>>,
}

impl InMemoryArtifactRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArtifactRepository for InMemoryArtifactRepository {
    async fn find(&self, id: Uuid) -> Result<Option<ArtifactOwnership>, ArtifactStoreError> {
        Ok(self.artifacts.read().await.get(&id).cloned())
    }

    async fn register(
        &self,
        artifact: ArtifactOwnership,
    ) -> Result<ArtifactOwnership, ArtifactStoreError> {
        let mut artifacts = self.artifacts.write().await;
        Ok(artifacts.entry(artifact.id).or_insert(artifact).clone())
    }

    async fn find_expired_temporary(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ArtifactOwnership>, ArtifactStoreError> {
        let artifacts = self.artifacts.read().await;
        let mut expired: Vec<ArtifactOwnership> = artifacts
            .values()
            .filter(|a| a.is_expired(now))
            .cloned()
            .collect();
        expired.sort_by_key(|a| a.retention_deadline);
        expired.truncate(limit);
        Ok(expired)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ArtifactStoreError> {
        Ok(self.artifacts.write().await.remove(&id).is_some())
    }

    async fn ping(&self) -> Result<(), ArtifactStoreError> {
        Ok(())
    }
}

use super::{parse_cache_owner, ArtifactService, ArtifactServiceError};
use crate::infrastructure::cache::{AudioCache, CacheKey, CacheObject};
use crate::infrastructure::repositories::ArtifactRepository;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Outcome of one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub expired_found: usize,
    pub deleted: usize,
    pub failed: usize,
    pub orphans_removed: usize,
}

/// Periodically deletes guest artifacts past retention, and cached audio
/// whose owner artifact no longer exists.
pub struct TemporaryArtifactReaper {
    artifacts: Arc<dyn ArtifactRepository>,
    service: Arc<ArtifactService>,
    cache: Arc<AudioCache>,
    retention: Duration,
    batch_size: usize,
    interval: std::time::Duration,
}

impl TemporaryArtifactReaper {
    pub fn new(
        artifacts: Arc<dyn ArtifactRepository>,
        service: Arc<ArtifactService>,
        cache: Arc<AudioCache>,
        retention: Duration,
        batch_size: usize,
        interval: std::time::Duration,
    ) -> Self {
        Self {
            artifacts,
            service,
            cache,
            retention,
            batch_size,
            interval,
        }
    }

    /// One pass over expired temporary artifacts, then over orphaned cache entries.
    ///
    /// The cache is listed once and its entries grouped by owner. A failure on
    /// one artifact is logged and counted; the rest of the batch still runs and
    /// the failed artifact is picked up again by the next sweep.
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<SweepReport, ArtifactServiceError> {
        let expired = self
            .artifacts
            .find_expired_temporary(now, self.batch_size)
            .await?;

        let mut by_owner: HashMap<String, Vec<(CacheKey, CacheObject)>> = HashMap::new();
        for (key, object) in self.cache.entries().await? {
            by_owner
                .entry(key.owner_id().to_string())
                .or_default()
                .push((key, object));
        }

        let mut report = SweepReport {
            expired_found: expired.len(),
            ..SweepReport::default()
        };

        for artifact in expired {
            let keys: Vec<CacheKey> = by_owner
                .remove(&artifact.cache_owner())
                .unwrap_or_default()
                .into_iter()
                .map(|(key, _)| key)
                .collect();

            match self.service.delete_artifact_entries(&artifact, &keys).await {
                Ok(_) => report.deleted += 1,
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(
                        artifact_id = %artifact.id,
                        error = %e,
                        "Failed to delete expired artifact, will retry next sweep"
                    );
                }
            }
        }

        report.orphans_removed = self.remove_orphans(by_owner, now - self.retention).await?;

        tracing::info!(
            expired_found = report.expired_found,
            deleted = report.deleted,
            failed = report.failed,
            orphans_removed = report.orphans_removed,
            "Artifact sweep finished"
        );
        Ok(report)
    }

    /// Remove entries older than `cutoff` whose owner artifact is gone, or of another kind
    async fn remove_orphans(
        &self,
        by_owner: HashMap<String, Vec<(CacheKey, CacheObject)>>,
        cutoff: DateTime<Utc>,
    ) -> Result<usize, ArtifactServiceError> {
        let mut removed = 0;

        for (owner, entries) in by_owner {
            let stale: Vec<CacheKey> = entries
                .into_iter()
                .filter(|(_, object)| object.created_at < cutoff)
                .map(|(key, _)| key)
                .collect();
            if stale.is_empty() || self.owner_exists(&owner).await? {
                continue;
            }

            for key in stale {
                match self.cache.remove(&key).await {
                    Ok(true) => removed += 1,
                    Ok(false) => {}
                    Err(e) => {
                        tracing::warn!(owner_id = %owner, error = %e, "Failed to remove orphaned audio");
                    }
                }
            }
        }

        Ok(removed)
    }

    async fn owner_exists(&self, owner: &str) -> Result<bool, ArtifactServiceError> {
        let Some((is_temporary, id)) = parse_cache_owner(owner) else {
            return Ok(false);
        };
        Ok(self
            .artifacts
            .find(id)
            .await?
            .is_some_and(|artifact| artifact.is_temporary == is_temporary))
    }

    /// Sweep every `interval` until `shutdown` is cancelled
    pub async fn run(self, shutdown: CancellationToken) {
        let mut interval = tokio::time::interval(self.interval);
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            retention_hours = self.retention.num_hours(),
            batch_size = self.batch_size,
            "Artifact reaper started"
        );

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = interval.tick() => {
                    if let Err(e) = self.sweep(Utc::now()).await {
                        tracing::error!(error = %e, "Artifact sweep failed");
                    }
                }
            }
        }

        tracing::info!("Artifact reaper stopped");
    }
}

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    domain::tts::TtsServiceError,
    error::AppResult,
    infrastructure::cache::{AudioCache, CacheStats},
};

#[derive(Debug, Deserialize)]
pub struct ClearCacheQuery {
    pub owner_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClearCacheResponse {
    pub removed: usize,
}

pub struct CacheController {
    cache: Arc<AudioCache>,
}

impl CacheController {
    pub fn new(cache: Arc<AudioCache>) -> Self {
        Self { cache }
    }

    /// GET /api/admin/cache/stats
    pub async fn stats(State(controller): State<Arc<CacheController>>) -> AppResult<Json<CacheStats>> {
        let stats = controller
            .cache
            .stats()
            .await
            .map_err(TtsServiceError::from)?;
        Ok(Json(stats))
    }

    /// DELETE /api/admin/cache?owner_id= - Clear one owner, or everything
    pub async fn clear(
        State(controller): State<Arc<CacheController>>,
        Query(query): Query<ClearCacheQuery>,
    ) -> AppResult<Json<ClearCacheResponse>> {
        let owner_id = query.owner_id.as_deref().filter(|o| !o.is_empty());
        let removed = controller.cache.clear(owner_id).await.map_err(|e| {
            tracing::warn!(owner_id = ?owner_id, "Cache clear aborted");
            TtsServiceError::from(e)
        })?;
        Ok(Json(ClearCacheResponse { removed }))
    }
}

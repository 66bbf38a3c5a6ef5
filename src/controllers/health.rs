use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;
use crate::infrastructure::repositories::ArtifactRepository;

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

pub async fn health_ready(
    State(artifacts): State<Arc<dyn ArtifactRepository>>,
) -> impl IntoResponse {
    match artifacts.ping().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ready",
                "artifact_store": "connected"
            })),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Artifact store ping failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "not_ready",
                    "artifact_store": "disconnected"
                })),
            )
        }
    }
}

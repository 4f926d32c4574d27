//! HTTP request handlers
//!
//! - `GET /health`: liveness plus model status
//! - `GET /ready`: 200 once the engine is loaded, 503 before
//! - `POST /predict`: multipart upload with an `image` field

use axum::{
    extract::{Multipart, Query, State},
    Json,
};
use tracing::debug;

use super::server::InferenceServer;
use super::types::{HttpError, PredictQuery, IMAGE_FIELD};
use crate::engine::{Classification, HealthStatus};
use crate::error::LiteCnnError;

pub async fn health_handler(State(server): State<InferenceServer>) -> Json<HealthStatus> {
    Json(match &server.engine {
        Some(engine) => engine.health(),
        None => HealthStatus::unloaded(),
    })
}

pub async fn ready_handler(
    State(server): State<InferenceServer>,
) -> Result<Json<serde_json::Value>, HttpError> {
    let engine = server.engine()?;
    Ok(Json(serde_json::json!({
        "ready": true,
        "num_classes": engine.num_classes(),
    })))
}

pub async fn predict_handler(
    State(server): State<InferenceServer>,
    Query(query): Query<PredictQuery>,
    mut multipart: Multipart,
) -> Result<Json<Classification>, HttpError> {
    let engine = server.engine()?.clone();

    let mut image = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| LiteCnnError::InvalidRequest(format!("malformed multipart body: {}", e)))?
    {
        if field.name() == Some(IMAGE_FIELD) {
            let bytes = field.bytes().await.map_err(|e| {
                LiteCnnError::InvalidRequest(format!("failed to read image field: {}", e))
            })?;
            image = Some(bytes);
            break;
        }
    }
    let image = image.ok_or_else(|| {
        LiteCnnError::InvalidRequest(format!("no '{}' file provided", IMAGE_FIELD))
    })?;
    debug!("Received {} byte image", image.len());

    let top_k = query.top_k;
    let result = tokio::task::spawn_blocking(move || engine.classify_bytes(&image, top_k))
        .await
        .map_err(|e| LiteCnnError::InternalError(format!("inference task failed: {}", e)))??;

    Ok(Json(result))
}

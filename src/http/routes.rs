//! HTTP route definitions
//!
//! CORS is open; uploads are capped at `max_body_bytes`.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

use super::handlers::{health_handler, predict_handler, ready_handler};
use super::server::InferenceServer;

pub fn create_router(server: InferenceServer, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .route("/predict", post(predict_handler))
        .layer(
            ServiceBuilder::new()
                .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any))
                .layer(DefaultBodyLimit::max(max_body_bytes)),
        )
        .with_state(server)
}

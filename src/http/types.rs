//! HTTP types for the LiteCNN server
//!
//! - [`HttpError`]: maps [`LiteCnnError`] categories to status codes
//! - Request query and response bodies

use axum::{
    http::{header::RETRY_AFTER, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::{ErrorCategory, LiteCnnError};

/// Suggested retry delay while the service is not ready (in seconds)
pub const RETRY_AFTER_SECONDS: u32 = 5;

/// Multipart field carrying the image
pub const IMAGE_FIELD: &str = "image";

/// HTTP error response with a status code derived from the error category
#[derive(Debug)]
pub struct HttpError {
    pub error: LiteCnnError,
    pub retry_after: Option<u32>,
}

impl HttpError {
    pub fn new(error: LiteCnnError) -> Self {
        let retry_after = error.is_recoverable().then_some(RETRY_AFTER_SECONDS);
        Self { error, retry_after }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.error.category() {
            ErrorCategory::User | ErrorCategory::Decode | ErrorCategory::Format => {
                StatusCode::BAD_REQUEST
            }
            ErrorCategory::Model | ErrorCategory::Shape | ErrorCategory::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ErrorCategory::Recoverable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<LiteCnnError> for HttpError {
    fn from(error: LiteCnnError) -> Self {
        Self::new(error)
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() && status != StatusCode::SERVICE_UNAVAILABLE {
            tracing::error!("Request failed: {}", self.error);
        } else {
            tracing::warn!("Request rejected: {}", self.error);
        }

        let body = Json(ErrorBody {
            error: self.error.to_string(),
            category: self.error.category().to_string(),
            recoverable: self.error.is_recoverable(),
            status: "error".to_string(),
        });

        let mut headers = HeaderMap::new();
        if let Some(retry_after) = self.retry_after {
            headers.insert(RETRY_AFTER, HeaderValue::from(retry_after));
        }

        (status, headers, body).into_response()
    }
}

/// JSON body of every error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub category: String,
    pub recoverable: bool,
    pub status: String,
}

/// Query string of `POST /predict`
#[derive(Debug, Default, Deserialize)]
pub struct PredictQuery {
    pub top_k: Option<usize>,
}

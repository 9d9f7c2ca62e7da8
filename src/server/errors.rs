// HTTP error mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::resolver::ResolveError;

/// Error answered as `{"error": "<short cause>"}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<ResolveError> for ApiError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::InvalidInput(msg) => Self::new(StatusCode::BAD_REQUEST, msg),
            ResolveError::NotFound(msg) => Self::new(StatusCode::NOT_FOUND, msg),
            ResolveError::ResolutionFailed(msg) => {
                tracing::error!(cause = %msg, "resolution failed");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
            ResolveError::UpstreamStream(msg) => Self::new(StatusCode::BAD_GATEWAY, msg),
        }
    }
}

//! Handler errors rendered as `{"error": "..."}` JSON.

use axum::{
    Json,
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

use crate::uploads::UploadError;

/// Maps storage errors into a logged, generic 500.
pub trait ResultExt<T> {
    fn db_err(self, context: &str) -> Result<T, ApiError>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for Result<T, E> {
    fn db_err(self, context: &str) -> Result<T, ApiError> {
        self.map_err(|e| ApiError::db_error(context, e))
    }
}

/// An error status with the message shown to the client.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn too_many_requests(message: impl Into<String>) -> Self {
        Self::new(StatusCode::TOO_MANY_REQUESTS, message)
    }

    /// Transient backend failure; the client may retry.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn db_error(context: &str, e: impl std::fmt::Display) -> Self {
        error!(error = %e, "{}", context);
        Self::internal("Database error")
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<UploadError> for ApiError {
    fn from(e: UploadError) -> Self {
        if e.is_client_error() {
            Self::bad_request(e.to_string())
        } else {
            error!(error = %e, "Failed to store upload");
            Self::internal("Failed to store avatar")
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

/// Fallback for unmatched routes.
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::not_found(format!("Page not found: {}", uri.path()))
}

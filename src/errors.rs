use axum::{http::StatusCode, Json};
use serde_json::json;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized() -> Self {
        Self::with_status(StatusCode::UNAUTHORIZED, "unauthorized")
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::CONFLICT, message)
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self::with_status(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }

    fn with_status(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

/// Failures while reading or writing the JSON state file.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("state file i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("state file encoding failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("state file {path} is not valid: {source}")]
    Corrupt {
        path: String,
        source: serde_json::Error,
    },
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        Self::internal(err)
    }
}

impl From<crate::export::ExportError> for AppError {
    fn from(err: crate::export::ExportError) -> Self {
        Self::internal(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(err)
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, "request failed: {}", self.message);
        }
        (self.status, Json(json!({ "ok": false, "error": self.message }))).into_response()
    }
}

use axum::response::{IntoResponse, Response};
use http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::PersistenceError;

#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self { status, code: code.to_string(), message: message.into() }
    }

    pub fn not_found() -> Self { Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", "Not found") }

    pub fn invalid(message: impl Into<String>) -> Self { Self::new(StatusCode::BAD_REQUEST, "INVALID_INPUT", message) }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", message)
    }
}

impl From<PersistenceError> for ApiError {
    fn from(err: PersistenceError) -> Self {
        let status = match err {
            PersistenceError::QuotaExceeded => StatusCode::INSUFFICIENT_STORAGE,
            PersistenceError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            PersistenceError::Parse(_) => StatusCode::BAD_REQUEST,
        };
        tracing::warn!(code = err.code(), error = %err, "persistence failure");
        Self::new(status, err.code(), err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response { (self.status, axum::Json(self)).into_response() }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ThemeBody { pub theme: String }

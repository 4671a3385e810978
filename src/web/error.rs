use crate::services::delivery_log::QueryError;
use crate::services::resolver::ResolveError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

/// Error payload for the query, stats and test-trigger surfaces: `{error, message}`.
/// Internal details go to the log, never to the caller.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Log store unavailable")
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.status.canonical_reason().unwrap_or("Error"),
            "message": self.message,
        });
        (self.status, Json(body)).into_response()
    }
}

impl From<QueryError> for AppError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::InvalidFilter(msg) => Self::bad_request(msg),
            other => {
                tracing::error!("Query error: {}", other);
                Self::internal()
            }
        }
    }
}

impl From<ResolveError> for AppError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::NotFound(_) | ResolveError::Inactive(_) => Self::not_found(err.to_string()),
            ResolveError::Store(e) => {
                tracing::error!("Endpoint lookup failed: {:#}", e);
                Self::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Endpoint configuration unavailable",
                )
            }
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        tracing::error!("Application error: {:?}", err);
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}

pub type AppResult<T> = Result<T, AppError>;

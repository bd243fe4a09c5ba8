// ---------------------------------------------------------------------------
// handlers/ — plain HTTP endpoints + the shared API error type
// ---------------------------------------------------------------------------

pub(crate) mod system;

pub use system::{health, info};

use axum::Json;
use axum::http::StatusCode;
use serde_json::json;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Centralized error type for the HTTP surface. Logs full detail server-side
/// and returns structured JSON to the client:
///
/// ```json
/// { "error": { "code": "NOT_FOUND", "message": "Session not found: abc" } }
/// ```
///
/// Session-protocol errors (bad/missing/unknown ids, wrong method) pass their
/// message through — the client needs it to recover. Internal faults return a
/// generic message; the detail stays in the logs.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Machine-readable error code string for each variant.
    fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::MethodNotAllowed(_) => "METHOD_NOT_ALLOWED",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP status code for each variant.
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to return to clients. Internal detail never leaks.
    fn client_message(&self) -> String {
        match self {
            ApiError::BadRequest(m) => m.clone(),
            ApiError::NotFound(m) => m.clone(),
            ApiError::MethodNotAllowed(m) => m.clone(),
            ApiError::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();

        tracing::error!(
            code = self.error_code(),
            "API error ({}): {}",
            status.as_u16(),
            self
        );

        let body = json!({
            "error": {
                "code": self.error_code(),
                "message": self.client_message(),
            }
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[test]
    fn not_found_maps_to_404_and_keeps_message() {
        let response = ApiError::NotFound("Session not found: s1".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn internal_error_hides_detail() {
        let err = ApiError::Internal("db password leaked".to_string());
        assert_eq!(err.client_message(), "Internal server error");
    }
}

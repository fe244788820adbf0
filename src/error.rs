//! Error types for the response cache
//!
//! Provides unified error handling using thiserror. Every variant maps onto
//! the admin JSON envelope `{ "status": "error", "message": ... }`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ApiResponse;

// == Cache Error Enum ==
/// Unified error type for the cache subsystem.
#[derive(Error, Debug)]
pub enum CacheError {
    /// A required admin parameter is missing or empty
    #[error("{0}")]
    Validation(String),

    /// The backing store could not be reached
    #[error("Cache store unavailable: {0}")]
    StoreUnavailable(String),

    /// The store rejected a write (oversized key or value)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A payload could not be encoded or decoded as JSON
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The upstream service failed to answer
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CacheError {
    /// HTTP status used when the error reaches a client.
    pub fn status_code(&self) -> StatusCode {
        match self {
            CacheError::Validation(_) | CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::Upstream(_) => StatusCode::BAD_GATEWAY,
            CacheError::Serialization(_) | CacheError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(ApiResponse::error(self.to_string()))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache subsystem.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_is_verbatim() {
        let err = CacheError::Validation("Pattern is required".to_string());
        assert_eq!(err.to_string(), "Pattern is required");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            CacheError::StoreUnavailable("down".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            CacheError::Upstream("refused".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            CacheError::InvalidRequest("too big".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn test_into_response_envelope() {
        let response = CacheError::Validation("Operation is required".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "Operation is required");
        assert!(json.get("data").is_none());
    }
}

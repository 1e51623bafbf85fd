//! HTTP error type. Every failure leaves the service as `{ "error": <message> }`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use medchat_core::MedchatError;
use medchat_llm::LlmError;
use serde_json::json;
use thiserror::Error;

/// Errors a handler can return.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed request data.
    #[error("{0}")]
    Validation(String),

    /// Missing, expired or invalid token; bad credentials.
    #[error("{0}")]
    Unauthorized(String),

    /// Unique constraint hit (email already registered).
    #[error("{0}")]
    Conflict(String),

    /// Referenced record does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The model API failed and the service propagates upstream errors.
    #[error(transparent)]
    Upstream(#[from] LlmError),

    /// Store, filesystem or other local failure.
    #[error("{0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, ApiError>;

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upstream(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<MedchatError> for ApiError {
    fn from(err: MedchatError) -> Self {
        match err {
            MedchatError::Validation(msg) => ApiError::Validation(msg),
            e @ (MedchatError::TokenMissing
            | MedchatError::TokenExpired
            | MedchatError::TokenInvalid
            | MedchatError::InvalidCredentials) => ApiError::Unauthorized(e.to_string()),
            e @ MedchatError::DuplicateEmail(_) => ApiError::Conflict(e.to_string()),
            e @ MedchatError::AccountNotFound(_) => ApiError::NotFound(e.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_map_to_status() {
        assert_eq!(
            ApiError::from(MedchatError::validation("No message provided")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::from(MedchatError::TokenExpired).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::from(MedchatError::DuplicateEmail("a@b.c".into())).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(MedchatError::Config("x".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn validation_message_is_verbatim() {
        let err = ApiError::from(MedchatError::validation("No data received"));
        assert_eq!(err.to_string(), "No data received");
    }

    #[test]
    fn upstream_is_500() {
        assert_eq!(ApiError::from(LlmError::EmptyResponse).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

//! Error handling for the REST API server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;

/// API error type.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
    pub suggestion: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
            details: None,
            suggestion: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    // Common error constructors
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, "CONFLICT", message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, "STORAGE_UNAVAILABLE", message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.status, self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.code,
                message: self.message,
                details: self.details,
                suggestion: self.suggestion,
            },
        };

        (self.status, Json(body)).into_response()
    }
}

// Convert from revise-core errors
impl From<revise_core::ReviseError> for ApiError {
    fn from(err: revise_core::ReviseError) -> Self {
        use revise_core::ReviseError;

        let code = err.code().as_str();
        let suggestion = err.suggestion().map(String::from);

        let api = match err {
            ReviseError::Validation {
                message, details, ..
            } => {
                let mut api = ApiError::validation(message);
                if !details.is_empty() {
                    api = api.with_details(serde_json::json!(details));
                }
                api
            }
            ReviseError::NotFound { message, .. } => ApiError::not_found(message),
            ReviseError::Conflict { message, .. } => ApiError::conflict(message),
            ReviseError::Storage { message, .. } => {
                ApiError::unavailable(format!("Storage error: {}", message))
            }
            ReviseError::Configuration(msg) => ApiError::bad_request(msg),
            ReviseError::Serialization(e) => {
                ApiError::internal(format!("Serialization error: {}", e))
            }
            ReviseError::Io(e) => ApiError::internal(format!("IO error: {}", e)),
            ReviseError::Internal(msg) => ApiError::internal(msg),
        };

        let mut api = api;
        api.code = code.to_string();
        if let Some(suggestion) = suggestion {
            api = api.with_suggestion(suggestion);
        }
        api
    }
}

/// Result type alias for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

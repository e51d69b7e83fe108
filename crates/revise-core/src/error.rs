//! Error types for revise operations.
//!
//! This module provides the error taxonomy shared by the scheduler, the
//! session manager, and the storage layer, with structured error codes and
//! suggestions for resolution.

use std::collections::HashMap;
use thiserror::Error;

/// Result type alias for revise operations.
pub type ReviseResult<T> = Result<T, ReviseError>;

/// Main error type for all revise operations.
#[derive(Error, Debug)]
pub enum ReviseError {
    /// Input validation failed. Never mutates state.
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        code: ErrorCode,
        details: HashMap<String, String>,
        suggestion: Option<String>,
    },

    /// Card, deck, or session not found (or not owned by the requester).
    #[error("Not found: {message}")]
    NotFound {
        message: String,
        code: ErrorCode,
        entity_id: Option<String>,
    },

    /// Out-of-order or duplicate rating submission against a session.
    #[error("Conflict: {message}")]
    Conflict {
        message: String,
        code: ErrorCode,
    },

    /// Underlying persistence failure (transient, retryable).
    #[error("Storage error: {message}")]
    Storage {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Validation (VAL_xxx)
    ValInvalidInput,
    ValMissingField,
    ValRatingOutOfRange,
    ValQualityOutOfRange,

    // Cards and decks (CARD_xxx / DECK_xxx)
    CardNotFound,
    DeckNotFound,

    // Sessions (SES_xxx)
    SessionNotFound,
    SessionCardMismatch,
    SessionAlreadyComplete,

    // Storage (DB_xxx)
    DbConnectionFailed,
    DbOperationFailed,

    // Internal
    Internal,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValInvalidInput => "VAL_001",
            ErrorCode::ValMissingField => "VAL_002",
            ErrorCode::ValRatingOutOfRange => "VAL_003",
            ErrorCode::ValQualityOutOfRange => "VAL_004",
            ErrorCode::CardNotFound => "CARD_001",
            ErrorCode::DeckNotFound => "DECK_001",
            ErrorCode::SessionNotFound => "SES_001",
            ErrorCode::SessionCardMismatch => "SES_002",
            ErrorCode::SessionAlreadyComplete => "SES_003",
            ErrorCode::DbConnectionFailed => "DB_001",
            ErrorCode::DbOperationFailed => "DB_002",
            ErrorCode::Internal => "INT_001",
        }
    }
}

impl ReviseError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            code: ErrorCode::ValInvalidInput,
            details: HashMap::new(),
            suggestion: None,
        }
    }

    /// Create a validation error with a specific code and the offending field.
    pub fn validation_field(
        message: impl Into<String>,
        code: ErrorCode,
        field: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        let mut details = HashMap::new();
        details.insert(field.into(), value.into());
        Self::Validation {
            message: message.into(),
            code,
            details,
            suggestion: None,
        }
    }

    /// Create a not-found error for a card.
    pub fn card_not_found(card_id: i64) -> Self {
        Self::NotFound {
            message: format!("Card with id '{}' not found", card_id),
            code: ErrorCode::CardNotFound,
            entity_id: Some(card_id.to_string()),
        }
    }

    /// Create a not-found error for a deck.
    pub fn deck_not_found(deck_id: i64) -> Self {
        Self::NotFound {
            message: format!("Deck with id '{}' not found", deck_id),
            code: ErrorCode::DeckNotFound,
            entity_id: Some(deck_id.to_string()),
        }
    }

    /// Create a not-found error for a session.
    pub fn session_not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            code: ErrorCode::SessionNotFound,
            entity_id: None,
        }
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>, code: ErrorCode) -> Self {
        Self::Conflict {
            message: message.into(),
            code,
        }
    }

    /// Create a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            code: ErrorCode::DbOperationFailed,
            source: None,
        }
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation { code, .. } => *code,
            Self::NotFound { code, .. } => *code,
            Self::Conflict { code, .. } => *code,
            Self::Storage { code, .. } => *code,
            _ => ErrorCode::Internal,
        }
    }

    /// Whether the caller may retry the operation unchanged.
    ///
    /// Storage failures are transient; everything else needs a changed
    /// request (or a session refetch, for conflicts).
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage { .. })
    }

    /// Get a user-friendly suggestion for resolving this error.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Validation { suggestion, .. } => suggestion.as_deref(),
            Self::NotFound { .. } => Some("Please check the id and ensure it exists"),
            Self::Conflict { .. } => {
                Some("Re-fetch the study session and retry with the current card")
            }
            Self::Storage { .. } => Some("The storage backend failed; retry the request"),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for ReviseError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage {
            message: err.to_string(),
            code: ErrorCode::DbOperationFailed,
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let err = ReviseError::validation("Invalid input");
        assert_eq!(err.code(), ErrorCode::ValInvalidInput);
        assert!(err.to_string().contains("Invalid input"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_card_not_found() {
        let err = ReviseError::card_not_found(42);
        assert_eq!(err.code(), ErrorCode::CardNotFound);
        assert!(err.to_string().contains("42"));
        assert!(err.suggestion().is_some());
    }

    #[test]
    fn test_storage_is_retryable() {
        let err = ReviseError::storage("disk full");
        assert!(err.is_retryable());
        assert_eq!(err.code(), ErrorCode::DbOperationFailed);
    }

    #[test]
    fn test_error_code_as_str() {
        assert_eq!(ErrorCode::ValRatingOutOfRange.as_str(), "VAL_003");
        assert_eq!(ErrorCode::SessionCardMismatch.as_str(), "SES_002");
    }

    #[test]
    fn test_validation_field_carries_details() {
        let err = ReviseError::validation_field(
            "rating must be between 1 and 4",
            ErrorCode::ValRatingOutOfRange,
            "rating",
            "7",
        );
        match err {
            ReviseError::Validation { details, code, .. } => {
                assert_eq!(code, ErrorCode::ValRatingOutOfRange);
                assert_eq!(details.get("rating").map(String::as_str), Some("7"));
            }
            _ => panic!("expected validation error"),
        }
    }
}

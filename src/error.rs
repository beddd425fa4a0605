use std::fmt;

use reqwest::StatusCode;
use thiserror::Error;

/// Failure reported by an API client
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Server {
        status: StatusCode,
        message: Option<String>,
    },

    #[error("unexpected response body: {0}")]
    Decode(String),

    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),

    /// Rejection that carries only a message, as produced by non-HTTP clients
    #[error("{0}")]
    Rejected(String),
}

impl ApiError {
    /// Human-readable message supplied by the server, if any
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Server { message, .. } => message.as_deref(),
            Self::Rejected(message) => Some(message),
            Self::Transport(_) | Self::Decode(_) | Self::InvalidConfig(_) => None,
        }
    }

    /// Server message or the given fallback
    pub fn message_or(&self, fallback: &str) -> String {
        self.server_message()
            .filter(|m| !m.is_empty())
            .unwrap_or(fallback)
            .to_string()
    }
}

/// Pending operation kinds tracked by the review store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingOperation {
    Posting,
    Deleting,
}

impl fmt::Display for PendingOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Posting => f.write_str("post"),
            Self::Deleting => f.write_str("delete"),
        }
    }
}

/// Error kinds surfaced by [`crate::ReviewSyncStore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ReviewPostFailed,
    ReviewDeleteFailed,
    OperationAlreadyInProgress,
    InvalidRating,
    ReviewNotFound,
    ProductMismatch,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReviewSyncError {
    #[error("{0}")]
    ReviewPostFailed(String),

    #[error("{0}")]
    ReviewDeleteFailed(String),

    #[error("a review {0} is already in progress")]
    OperationAlreadyInProgress(PendingOperation),

    #[error("rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),

    #[error("review {0} is not in the current list")]
    ReviewNotFound(String),

    #[error("store holds reviews for product {expected}, not {requested}")]
    ProductMismatch { expected: String, requested: String },
}

impl ReviewSyncError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ReviewPostFailed(_) => ErrorKind::ReviewPostFailed,
            Self::ReviewDeleteFailed(_) => ErrorKind::ReviewDeleteFailed,
            Self::OperationAlreadyInProgress(_) => ErrorKind::OperationAlreadyInProgress,
            Self::InvalidRating(_) => ErrorKind::InvalidRating,
            Self::ReviewNotFound(_) => ErrorKind::ReviewNotFound,
            Self::ProductMismatch { .. } => ErrorKind::ProductMismatch,
        }
    }

    /// Message suitable for showing to the user
    pub fn message(&self) -> String {
        self.to_string()
    }
}

/// Error surfaced by [`crate::CatalogStore`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct CatalogError {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_prefers_server_text() {
        let err = ApiError::Server {
            status: StatusCode::BAD_REQUEST,
            message: Some("You already reviewed this".to_string()),
        };
        assert_eq!(err.message_or("fallback"), "You already reviewed this");
    }

    #[test]
    fn test_message_falls_back() {
        let err = ApiError::Server {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: None,
        };
        assert_eq!(err.message_or("Failed to post review."), "Failed to post review.");

        let err = ApiError::Decode("eof".to_string());
        assert_eq!(err.message_or("Failed to post review."), "Failed to post review.");

        let err = ApiError::Rejected(String::new());
        assert_eq!(err.message_or("Failed to post review."), "Failed to post review.");
    }

    #[test]
    fn test_sync_error_kind_and_message() {
        let err = ReviewSyncError::ReviewPostFailed("Failed to post review.".to_string());
        assert_eq!(err.kind(), ErrorKind::ReviewPostFailed);
        assert_eq!(err.message(), "Failed to post review.");

        let err = ReviewSyncError::OperationAlreadyInProgress(PendingOperation::Deleting);
        assert_eq!(err.kind(), ErrorKind::OperationAlreadyInProgress);
        assert!(err.message().contains("delete"));
    }
}

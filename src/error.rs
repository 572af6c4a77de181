//! Error types for content loading and the subscription proxy

use axum::http::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading, parsing or rendering content
#[derive(Debug, Error)]
pub enum BlogError {
    /// The requested id has no content file
    #[error("post not found: {0}")]
    NotFound(String),

    /// Front matter is unterminated, or a required field is missing or mistyped
    #[error("malformed content in {id}: {reason}")]
    MalformedContent { id: String, reason: String },

    /// Markdown to HTML conversion failed
    #[error("failed to render {id}: {reason}")]
    Render { id: String, reason: String },

    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BlogError {
    pub(crate) fn malformed(id: &str, reason: impl Into<String>) -> Self {
        BlogError::MalformedContent {
            id: id.to_string(),
            reason: reason.into(),
        }
    }
}

/// Errors raised by the newsletter subscription proxy
#[derive(Debug, Error)]
pub enum SubscribeError {
    #[error("Email is required")]
    Validation,

    /// The mailing list API answered with an error status
    #[error("mailing list rejected the request with status {0}")]
    Upstream(u16),

    /// Credentials are missing or unusable
    #[error("mailing list is not configured: {0}")]
    Config(String),

    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl SubscribeError {
    /// HTTP status returned to the browser
    pub fn status(&self) -> StatusCode {
        match self {
            SubscribeError::Validation | SubscribeError::Upstream(_) => StatusCode::BAD_REQUEST,
            SubscribeError::Config(_) | SubscribeError::Unexpected(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<reqwest::Error> for SubscribeError {
    fn from(e: reqwest::Error) -> Self {
        SubscribeError::Unexpected(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribe_error_status() {
        assert_eq!(SubscribeError::Validation.status(), StatusCode::BAD_REQUEST);
        assert_eq!(SubscribeError::Upstream(400).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            SubscribeError::Config("missing key".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            SubscribeError::Unexpected("timeout".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_validation_message() {
        assert_eq!(SubscribeError::Validation.to_string(), "Email is required");
    }

    #[test]
    fn test_malformed_helper() {
        let err = BlogError::malformed("hello", "missing title");
        assert_eq!(err.to_string(), "malformed content in hello: missing title");
    }
}

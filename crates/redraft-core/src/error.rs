//! Error types for the redraft assistant.

use thiserror::Error;

/// Result type alias using redraft's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for redraft operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Document not found
    #[error("Document not found: {0}")]
    DocumentNotFound(uuid::Uuid),

    /// Embedding generation failed
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Inference/generation failed
    #[error("Inference error: {0}")]
    Inference(String),

    /// Conversation history cache or log failed
    #[error("History error: {0}")]
    History(String),

    /// Document exceeds the agent rewrite size cap
    #[error("Document too large for rewrite: {size} bytes (max {max})")]
    DocumentTooLarge { size: usize, max: usize },

    /// Model returned a full-rewrite response that is not markup
    #[error("Malformed rewrite output: {0}")]
    MalformedRewrite(String),

    /// Streaming request was cancelled by the caller
    #[error("Stream cancelled")]
    Cancelled,

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),
}

impl Error {
    /// Whether the caller may retry the operation unchanged and expect it
    /// to possibly succeed.
    ///
    /// Malformed rewrites are retryable (the model may produce valid markup
    /// next time); transport and inference failures are transient. Input
    /// errors and size-cap rejections require a corrected request.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::MalformedRewrite(_) | Error::Inference(_) | Error::Request(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("review session".to_string());
        assert_eq!(err.to_string(), "Not found: review session");
    }

    #[test]
    fn test_error_display_document_not_found() {
        let id = Uuid::nil();
        let err = Error::DocumentNotFound(id);
        assert_eq!(err.to_string(), format!("Document not found: {}", id));
    }

    #[test]
    fn test_error_display_document_too_large() {
        let err = Error::DocumentTooLarge {
            size: 600_000,
            max: 512_000,
        };
        assert_eq!(
            err.to_string(),
            "Document too large for rewrite: 600000 bytes (max 512000)"
        );
    }

    #[test]
    fn test_error_display_malformed_rewrite() {
        let err = Error::MalformedRewrite("response did not start with a tag".to_string());
        assert!(err.to_string().contains("Malformed rewrite output"));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(Error::MalformedRewrite("x".into()).is_retryable());
        assert!(Error::Inference("timeout".into()).is_retryable());
        assert!(Error::Request("connection reset".into()).is_retryable());

        assert!(!Error::InvalidInput("empty prompt".into()).is_retryable());
        assert!(!Error::DocumentTooLarge { size: 1, max: 0 }.is_retryable());
        assert!(!Error::Cancelled.is_retryable());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }

    #[test]
    fn test_result_type_ok() {
        fn get_result() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(get_result().unwrap(), 42);
    }
}

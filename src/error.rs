//! Error types for the feed.

use crate::sessions::SessionId;
use thiserror::Error;

/// Main error type for feed operations.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("Shutdown in progress")]
    ShutdownInProgress,

    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

/// Encoding failures. Malformed requests are reported as
/// `Deserialization` where they are decoded.
impl From<serde_json::Error> for FeedError {
    fn from(e: serde_json::Error) -> Self {
        FeedError::Serialization(e.to_string())
    }
}

/// Result type for feed operations.
pub type Result<T> = std::result::Result<T, FeedError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_encode_failure_converts_to_serialization() {
        fn encode(value: &HashMap<(u8, u8), u8>) -> Result<String> {
            Ok(serde_json::to_string(value)?)
        }

        let value = HashMap::from([((1, 2), 3)]);
        let err = encode(&value).unwrap_err();
        assert!(matches!(err, FeedError::Serialization(_)));
        assert!(err.to_string().starts_with("Serialization error"));
    }
}

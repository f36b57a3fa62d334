//! Client error types

use serde_json::Value;
use thiserror::Error;

/// Errors raised by a durable storage backend
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem error from a file-backed store
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored contents could not be (de)serialized
    #[error("Storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend-specific failure or unsupported operation
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// Redis error (when redis-store feature is enabled)
    #[cfg(feature = "redis-store")]
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// Errors that can occur while talking to the console backend
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced an HTTP response (connect, TLS, timeout, I/O)
    #[error("Transport error: {0}")]
    Transport(String),

    /// The backend answered with a status outside the accepted set
    #[error("Unexpected HTTP status {status}")]
    UnexpectedStatus { status: u16, body: Value },

    /// The response body did not match the expected shape
    #[error("Decode error: {0}")]
    Decode(String),

    /// The token issued by the backend is malformed or its signature does not verify
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// The resource type does not offer the requested operation
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Bad client configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Durable storage failure
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ClientError {
    /// HTTP status carried by the error, if the backend answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The backend's `{"error": "..."}` message, if present
    pub fn api_message(&self) -> Option<&str> {
        match self {
            ClientError::UnexpectedStatus { body, .. } => body.get("error").and_then(Value::as_str),
            _ => None,
        }
    }

    /// Whether the request failed before any response arrived
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::InvalidConfig(err.to_string())
    }
}

//! Error types for Cachette
//!
//! Provides a unified error type for server, engine, and client operations.
//! Per-command variants are rendered into `{"error": ...}` responses by the
//! engine; transport variants only ever surface on the client side or evict a
//! server connection.

use thiserror::Error;

/// Result type alias using CacheError
pub type Result<T> = std::result::Result<T, CacheError>;

/// Unified error type for Cachette operations
#[derive(Debug, Error)]
pub enum CacheError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Authentication failed")]
    Authentication,

    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    // -------------------------------------------------------------------------
    // Command Validation Errors
    // -------------------------------------------------------------------------
    #[error("Missing parameter {0}")]
    MissingParameter(&'static str),

    #[error("Invalid parameter {0}")]
    InvalidParameter(String),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Key does not exist")]
    KeyNotFound,

    #[error("Target key is not a list")]
    TargetNotList,

    #[error("The value must be a sequence")]
    ValueNotSequence,

    // -------------------------------------------------------------------------
    // Client Errors
    // -------------------------------------------------------------------------
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Timeout reading from socket after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Failed to connect after {0} attempts")]
    ReconnectExhausted(u32),

    #[error("Server error: {0}")]
    Remote(String),

    #[error("Unexpected response: expected {expected}, got {actual}")]
    UnexpectedResponse {
        expected: &'static str,
        actual: String,
    },

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::MalformedFrame(err.to_string())
    }
}

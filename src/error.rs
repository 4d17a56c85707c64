//! Error types for Textly
//!
//! This module defines all error types used throughout the client,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Textly operations
///
/// This enum encompasses all possible errors that can occur while talking
/// to the workspace backend: configuration loading, API calls, chat
/// streaming, workspace tree operations, and local settings persistence.
#[derive(Error, Debug)]
pub enum TextlyError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Backend API errors (non-2xx responses, malformed payloads)
    #[error("API error: {0}")]
    Api(String),

    /// Authentication required or rejected (e.g. 401 Unauthorized)
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Chat state errors (unknown conversation, invalid edit target)
    #[error("Chat error: {0}")]
    Chat(String),

    /// Streaming errors (broken SSE stream, transport failure mid-stream)
    #[error("Stream error: {0}")]
    Stream(String),

    /// Workspace tree errors (invalid moves, unknown records)
    #[error("Workspace error: {0}")]
    Workspace(String),

    /// Local settings persistence errors
    #[error("Settings error: {0}")]
    Settings(String),

    /// The in-flight request was cancelled by the user
    ///
    /// Matched by identity to distinguish user cancellation from real
    /// failures; the display string is the exact message surfaced in the
    /// chat error field.
    #[error("Conversation stopped by user")]
    Stopped,

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Keyring/credential storage errors
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),
}

/// Result type alias for Textly operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;

/// Check whether an error is the user-cancellation marker
///
/// # Arguments
///
/// * `error` - The error to inspect
///
/// # Examples
///
/// ```
/// use textly::error::{is_stopped, TextlyError};
///
/// let err = anyhow::Error::from(TextlyError::Stopped);
/// assert!(is_stopped(&err));
///
/// let err = anyhow::Error::from(TextlyError::Api("boom".to_string()));
/// assert!(!is_stopped(&err));
/// ```
pub fn is_stopped(error: &anyhow::Error) -> bool {
    matches!(error.downcast_ref::<TextlyError>(), Some(TextlyError::Stopped))
}

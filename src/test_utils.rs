//! Test utilities for Textly
//!
//! This module provides common test helpers: temporary directories,
//! test configuration, and an SSE body builder for streaming tests.

use crate::config::Config;
use tempfile::TempDir;

/// Create a temporary directory for testing
///
/// # Returns
///
/// Returns a TempDir that will be cleaned up when dropped
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// Create a test configuration with default values
///
/// # Returns
///
/// Returns a Config instance suitable for testing
pub fn test_config() -> Config {
    Config::default()
}

/// Build an SSE body from raw `data:` payloads
///
/// Each payload becomes one `data: <payload>\n\n` event, matching the
/// framing the chat endpoints produce.
pub fn sse_body(payloads: &[&str]) -> String {
    payloads
        .iter()
        .map(|p| format!("data: {}\n\n", p))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_dir_creation() {
        let dir = temp_dir();
        assert!(dir.path().exists());
    }

    #[test]
    fn test_test_config_is_valid() {
        let config = test_config();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sse_body_framing() {
        let body = sse_body(&["one", "[DONE]"]);
        assert_eq!(body, "data: one\n\ndata: [DONE]\n\n");
    }
}

//! Textly - terminal client for the Textly markdown workspace
//!
//! This library provides the client-side core of Textly: streaming AI
//! chat with optimistic state and server-id reconciliation, quick text
//! actions, document/folder tree management, and persisted client
//! settings.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `api`: HTTP clients for the backend (conversations, documents,
//!   models, assist, auth)
//! - `chat`: messages, SSE parsing, stream reconciliation, state store,
//!   and the chat/assist services
//! - `workspace`: document records, tree building, realtime feed
//! - `models`: model capabilities, overrides, effective request ids
//! - `settings`: persisted client settings
//! - `config`: configuration management and validation
//! - `error`: error types and result aliases
//! - `cli`: command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use textly::config::Config;
//!
//! let config = Config::load("config/config.yaml").unwrap();
//! config.validate().unwrap();
//! ```

pub mod api;
pub mod chat;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod settings;
pub mod workspace;

// Re-export commonly used types
pub use chat::{ChatService, ChatStore, SendOptions};
pub use config::Config;
pub use error::{Result, TextlyError};

#[cfg(test)]
pub mod test_utils;

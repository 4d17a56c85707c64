/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint:

- `chat`   — Interactive chat session with streaming replies
- `docs`   — Document tree listing, moves, and the realtime watch
- `models` — Model catalog listing and selection
- `assist` — One-shot quick actions
- `auth`   — Password login and token caching

The handlers are intentionally small and use the library components:
the API clients, the chat service, and the workspace tree.
*/

pub mod assist;
pub mod auth;
pub mod chat;
pub mod docs;
pub mod models;

use std::time::Duration;

use crate::api::{auth as api_auth, ApiClient};
use crate::config::Config;
use crate::error::{Result, TextlyError};

/// Builds an API client from config, resolving the bearer token
///
/// # Arguments
///
/// * `config` - Loaded configuration
/// * `require_token` - When true, a missing token is an error with a
///   hint to run `textly auth`
pub(crate) fn api_client(config: &Config, require_token: bool) -> Result<ApiClient> {
    let token = api_auth::resolve_token(config)?;
    if require_token && token.is_none() {
        return Err(TextlyError::Authentication(
            "no token available; run `textly auth` first".to_string(),
        )
        .into());
    }
    ApiClient::new(
        &config.server.base_url,
        token,
        Duration::from_secs(config.server.connect_timeout_seconds),
    )
}

//! Authentication against the workspace backend
//!
//! The client performs a single password login round-trip against the
//! record store's auth endpoint and carries the returned bearer token.
//! Tokens resolve from config, then the `TEXTLY_TOKEN` environment
//! variable, then the OS keyring, where `textly auth` caches them.

use serde::Deserialize;

use crate::api::ApiClient;
use crate::config::Config;
use crate::error::Result;

/// Keyring service name for cached tokens
pub const KEYRING_SERVICE: &str = "textly";

/// Keyring account name for the backend token
pub const KEYRING_ACCOUNT: &str = "api-token";

/// Environment variable consulted before the keyring
pub const TOKEN_ENV: &str = "TEXTLY_TOKEN";

/// Password login endpoint of the record store
const AUTH_PATH: &str = "/api/collections/users/auth-with-password";

/// Successful login response
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    /// Bearer token for subsequent requests
    pub token: String,
    /// The authenticated user record
    pub record: AuthRecord,
}

/// Authenticated user record
#[derive(Debug, Clone, Deserialize)]
pub struct AuthRecord {
    /// User id
    pub id: String,
    /// User email, when the backend exposes it
    #[serde(default)]
    pub email: String,
}

/// Logs in with identity and password
///
/// # Arguments
///
/// * `client` - API client without a token
/// * `identity` - Login identity (email)
/// * `password` - Account password
///
/// # Errors
///
/// Returns an authentication error for rejected credentials and an API
/// error for other failures.
pub async fn login(client: &ApiClient, identity: &str, password: &str) -> Result<AuthResponse> {
    let body = serde_json::json!({
        "identity": identity,
        "password": password,
    });
    client.post_json(AUTH_PATH, &body).await
}

/// Caches a token in the OS keyring
pub fn store_token(token: &str) -> Result<()> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, KEYRING_ACCOUNT)?;
    entry.set_password(token)?;
    Ok(())
}

/// Removes the cached token from the OS keyring
pub fn clear_token() -> Result<()> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, KEYRING_ACCOUNT)?;
    match entry.delete_password() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Resolves the bearer token for backend requests
///
/// Order: explicit config value, `TEXTLY_TOKEN` environment variable,
/// OS keyring. Returns `None` when no token is available anywhere.
pub fn resolve_token(config: &Config) -> Result<Option<String>> {
    if let Some(token) = &config.server.token {
        if !token.is_empty() {
            return Ok(Some(token.clone()));
        }
    }

    if let Ok(token) = std::env::var(TOKEN_ENV) {
        if !token.is_empty() {
            return Ok(Some(token));
        }
    }

    let entry = keyring::Entry::new(KEYRING_SERVICE, KEYRING_ACCOUNT)?;
    match entry.get_password() {
        Ok(token) => Ok(Some(token)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

//! Password login and token caching

use colored::Colorize;
use rustyline::DefaultEditor;

use crate::api::auth;
use crate::config::Config;
use crate::error::{Result, TextlyError};

/// Logs in against the backend and caches the token in the OS keyring
///
/// # Arguments
///
/// * `config` - Global configuration
/// * `identity` - Login identity override; falls back to config, then an
///   interactive prompt
pub async fn run_auth(config: Config, identity: Option<String>) -> Result<()> {
    let identity = match identity.or(config.server.identity.clone()) {
        Some(identity) => identity,
        None => {
            let mut rl = DefaultEditor::new()?;
            let entered = rl.readline("Email: ")?;
            let entered = entered.trim().to_string();
            if entered.is_empty() {
                return Err(TextlyError::Authentication(
                    "an identity is required to log in".to_string(),
                )
                .into());
            }
            entered
        }
    };

    let password = rpassword::prompt_password("Password: ")?;

    // Login happens without a token.
    let api = crate::api::ApiClient::new(
        &config.server.base_url,
        None,
        std::time::Duration::from_secs(config.server.connect_timeout_seconds),
    )?;

    let response = auth::login(&api, &identity, &password).await?;
    auth::store_token(&response.token)?;

    println!(
        "Logged in as {} — token cached in the system keyring",
        identity.bold()
    );
    Ok(())
}

//! One-shot quick actions

use colored::Colorize;

use crate::api::assist::AssistClient;
use crate::chat::assist::AssistService;
use crate::chat::store::ChatStore;
use crate::cli::AssistCommand;
use crate::config::Config;
use crate::error::Result;

/// Dispatches an `assist` subcommand
pub async fn run_assist(config: Config, command: AssistCommand) -> Result<()> {
    let api = super::api_client(&config, true)?;
    let service = AssistService::new(
        AssistClient::new(api),
        ChatStore::new(),
        config.chat.max_suggestion_history,
        config.assist.max_context_words,
    );

    let suggestion = match command {
        AssistCommand::Improve { text, context } => {
            service
                .improve(&text, context.as_deref().unwrap_or(""))
                .await?
        }
        AssistCommand::Synonyms { text, context } => {
            service
                .synonyms(&text, context.as_deref().unwrap_or(""))
                .await?
        }
        AssistCommand::Describe { text, context } => {
            service
                .describe(&text, context.as_deref().unwrap_or(""))
                .await?
        }
    };

    println!("{}", suggestion.green());
    Ok(())
}

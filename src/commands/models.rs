//! Model management commands

use colored::Colorize;
use prettytable::{row, Table};

use crate::api::models::ModelClient;
use crate::cli::ModelsCommand;
use crate::config::Config;
use crate::error::{Result, TextlyError};
use crate::models::{effective_model_id, select_model, ChatModel};
use crate::settings::SettingsStore;

/// Dispatches a `models` subcommand
pub async fn run_models(config: Config, command: ModelsCommand) -> Result<()> {
    let api = super::api_client(&config, true)?;
    let client = ModelClient::new(api);

    match command {
        ModelsCommand::List { json } => {
            let models: Vec<ChatModel> = client
                .list()
                .await?
                .iter()
                .map(ChatModel::from_record)
                .collect();

            if json {
                println!("{}", serde_json::to_string_pretty(&models)?);
                return Ok(());
            }

            let mut table = Table::new();
            table.add_row(row!["ID", "Name", "Provider", "Capabilities", "Default"]);
            for model in &models {
                table.add_row(row![
                    model.id,
                    model.name,
                    model.provider,
                    capability_summary(model),
                    if model.is_default { "yes" } else { "" },
                ]);
            }
            table.printstd();
            Ok(())
        }
        ModelsCommand::Select { model } => {
            let models: Vec<ChatModel> = client
                .list()
                .await?
                .iter()
                .map(ChatModel::from_record)
                .collect();
            if !models.iter().any(|m| m.id == model) {
                return Err(
                    TextlyError::Config(format!("unknown model '{}'", model)).into()
                );
            }

            let store = SettingsStore::new()?;
            let mut settings = store.load()?;
            settings.selected_model = Some(model.clone());
            store.save(&settings)?;
            println!("Selected model {}", model.bold());
            Ok(())
        }
        ModelsCommand::Current => {
            let models: Vec<ChatModel> = client
                .list()
                .await?
                .iter()
                .map(ChatModel::from_record)
                .collect();

            let store = SettingsStore::new()?;
            let settings = store.load()?;
            match select_model(&models, settings.selected_model.as_deref()) {
                Some(model) => {
                    let overrides = settings.overrides_for(&model.id);
                    println!("Selected: {} ({})", model.name.bold(), model.id);
                    println!(
                        "Effective request id: {}",
                        effective_model_id(model, &overrides)
                    );
                }
                None => println!("No models available"),
            }
            Ok(())
        }
    }
}

/// Short capability string for the listing table
fn capability_summary(model: &ChatModel) -> String {
    let mut parts = vec!["chat"];
    if model.capabilities.reasoning {
        parts.push("reasoning");
    }
    if model.capabilities.internet {
        parts.push("internet");
    }
    parts.join(", ")
}

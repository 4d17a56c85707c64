//! Interactive chat session
//!
//! A readline loop over the chat service. While a reply streams in, a
//! render task subscribed to the store prints each new content suffix as
//! it lands; Ctrl-C during a stream cancels it through the service.

use std::io::Write;
use std::sync::Arc;

use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::api::conversations::HttpConversationClient;
use crate::api::models::ModelClient;
use crate::chat::message::Role;
use crate::chat::service::{ChatService, SendOptions};
use crate::chat::store::ChatStore;
use crate::config::Config;
use crate::error::Result;
use crate::models::{
    effective_model_id, select_model, should_use_reasoning, ChatModel,
};
use crate::settings::SettingsStore;

/// Runs the interactive chat session
///
/// # Arguments
///
/// * `config` - Global configuration (consumed)
/// * `resume` - Conversation id to reopen
/// * `model_override` - Model id overriding the saved selection
pub async fn run_chat(
    config: Config,
    resume: Option<String>,
    model_override: Option<String>,
) -> Result<()> {
    let api = super::api_client(&config, true)?;

    let settings_store = SettingsStore::new()?;
    let mut settings = settings_store.load()?;

    // The model catalog is best-effort: chat works without it, the
    // backend just falls back to its default model.
    let models: Vec<ChatModel> = match ModelClient::new(api.clone()).list().await {
        Ok(records) => records.iter().map(ChatModel::from_record).collect(),
        Err(e) => {
            tracing::warn!("Could not load model catalog: {}", e);
            Vec::new()
        }
    };
    let saved_model = model_override.or(settings.selected_model.clone());
    let selected = select_model(&models, saved_model.as_deref()).cloned();
    let options = send_options(selected.as_ref(), &settings);

    let store = ChatStore::new();
    let service = Arc::new(ChatService::new(
        Arc::new(HttpConversationClient::new(api)),
        store.clone(),
        config.chat.max_conversations,
    ));

    if let Err(e) = service.refresh_conversations().await {
        tracing::warn!("Could not load conversation list: {}", e);
    }

    let resume_id = resume.or(settings.last_conversation_id.clone());
    if let Some(id) = resume_id {
        if service.load_conversation(&id, false).await.is_ok() {
            print_transcript(&store);
        }
    }

    print_banner(selected.as_ref());

    let mut rl = DefaultEditor::new()?;
    loop {
        match rl.readline(&"textly> ".cyan().to_string()) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                rl.add_history_entry(trimmed)?;

                match trimmed {
                    "exit" | "quit" => break,
                    "/help" => {
                        print_help();
                        continue;
                    }
                    "/new" => {
                        service.new_conversation();
                        println!("Started a new conversation\n");
                        continue;
                    }
                    "/list" => {
                        print_conversation_list(&store);
                        continue;
                    }
                    _ => {}
                }

                if let Some(rest) = trimmed.strip_prefix("/open ") {
                    let id = rest.trim().to_string();
                    match service.load_conversation(&id, false).await {
                        Ok(()) => print_transcript(&store),
                        Err(e) => eprintln!("{}", format!("Error: {}", e).red()),
                    }
                    continue;
                }

                if let Some(rest) = trimmed.strip_prefix("/delete ") {
                    let id = rest.trim().to_string();
                    match service.delete_conversation(&id).await {
                        Ok(()) => println!("Deleted {}\n", id),
                        Err(e) => eprintln!("{}", format!("Error: {}", e).red()),
                    }
                    continue;
                }

                if let Some(rest) = trimmed.strip_prefix("/edit ") {
                    let mut parts = rest.trim().splitn(2, ' ');
                    let (message_id, new_content) = match (parts.next(), parts.next()) {
                        (Some(id), Some(content)) if !content.trim().is_empty() => {
                            (id.to_string(), content.to_string())
                        }
                        _ => {
                            eprintln!("Usage: /edit <message-id> <new content>");
                            continue;
                        }
                    };
                    let conversation_id = store.read(|s| s.current_id.clone());
                    let Some(conversation_id) = conversation_id else {
                        eprintln!("No conversation is open");
                        continue;
                    };
                    stream_round(&service, &store, StreamKind::Edit {
                        conversation_id,
                        message_id,
                        new_content,
                    }, &options)
                    .await;
                    continue;
                }

                stream_round(
                    &service,
                    &store,
                    StreamKind::Send {
                        message: trimmed.to_string(),
                    },
                    &options,
                )
                .await;
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(err) => {
                tracing::error!("Readline error: {:?}", err);
                break;
            }
        }
    }

    // Remember the open conversation for the next session.
    settings.last_conversation_id = store.read(|s| s.current_id.clone());
    settings.active_tab = Some("chat".to_string());
    settings_store.save(&settings)?;

    println!("Goodbye!");
    Ok(())
}

/// What kind of streamed round to run
enum StreamKind {
    Send {
        message: String,
    },
    Edit {
        conversation_id: String,
        message_id: String,
        new_content: String,
    },
}

/// Runs one streamed round: render task + request + Ctrl-C handling
async fn stream_round(
    service: &Arc<ChatService>,
    store: &ChatStore,
    kind: StreamKind,
    options: &SendOptions,
) {
    let render = spawn_renderer(store.clone());

    let runner = Arc::clone(service);
    let options = options.clone();
    let request = async move {
        match kind {
            StreamKind::Send { message } => runner.send(&message, None, &options).await,
            StreamKind::Edit {
                conversation_id,
                message_id,
                new_content,
            } => {
                runner
                    .edit(&conversation_id, &message_id, &new_content, &options)
                    .await
            }
        }
    };

    let result = tokio::select! {
        result = request => result,
        _ = tokio::signal::ctrl_c() => {
            service.stop();
            Ok(())
        }
    };

    let _ = render.await;
    println!();

    if let Err(e) = result {
        tracing::debug!("Chat round failed: {}", e);
    }
    if let Some(error) = store.read(|s| s.chat_error.clone()) {
        eprintln!("{}", error.red());
    }
}

/// Prints assistant content incrementally as the store changes
fn spawn_renderer(store: ChatStore) -> tokio::task::JoinHandle<()> {
    let mut revisions = store.subscribe();
    tokio::spawn(async move {
        // Start past any reply from an earlier round; the fresh assistant
        // placeholder resets this to zero when it appears.
        let mut printed = store.read(|state| {
            state
                .current()
                .and_then(|c| c.messages.iter().rev().find(|m| m.role == Role::Assistant))
                .map(|m| m.content.len())
                .unwrap_or(0)
        });
        let mut thinking_shown = false;
        loop {
            if revisions.changed().await.is_err() {
                break;
            }
            let (content, thinking, loading) = store.read(|state| {
                let last = state
                    .current()
                    .and_then(|c| c.messages.iter().rev().find(|m| m.role == Role::Assistant));
                (
                    last.map(|m| m.content.clone()).unwrap_or_default(),
                    last.and_then(|m| m.thinking).unwrap_or(false),
                    state.is_chat_loading,
                )
            });

            if content.len() < printed {
                printed = 0;
            }
            if thinking && !thinking_shown {
                print!("{}", "[thinking] ".dimmed());
                thinking_shown = true;
            }
            if content.len() > printed {
                print!("{}", &content[printed..]);
                let _ = std::io::stdout().flush();
                printed = content.len();
            }
            if !loading {
                break;
            }
        }
    })
}

fn print_banner(model: Option<&ChatModel>) {
    println!("\nTextly chat. Type '/help' for commands, 'exit' to quit");
    match model {
        Some(model) => println!("Model: {} ({})\n", model.name.bold(), model.id),
        None => println!("Model: backend default\n"),
    }
}

fn print_help() {
    println!("Commands:");
    println!("  /new                        start a new conversation");
    println!("  /list                       list conversations");
    println!("  /open <conversation-id>     open a conversation");
    println!("  /edit <message-id> <text>   edit a user message and regenerate");
    println!("  /delete <conversation-id>   deactivate a conversation");
    println!("  exit                        leave\n");
}

fn print_conversation_list(store: &ChatStore) {
    store.read(|state| {
        if state.conversations.is_empty() {
            println!("No conversations yet\n");
            return;
        }
        for conversation in &state.conversations {
            let marker = if state.current_id.as_deref() == Some(conversation.id.as_str()) {
                "*"
            } else {
                " "
            };
            println!(
                "{} {}  {}",
                marker,
                conversation.id.yellow(),
                conversation.title
            );
        }
        println!();
    });
}

fn print_transcript(store: &ChatStore) {
    store.read(|state| {
        let Some(conversation) = state.current() else {
            return;
        };
        println!("\n{}", conversation.title.bold());
        for message in &conversation.messages {
            match message.role {
                Role::User => println!("{} {}", "you:".green(), message.content),
                Role::Assistant => println!("{} {}", "ai: ".cyan(), message.content),
            }
        }
        println!();
    });
}

/// Builds the per-request options from the selected model and overrides
fn send_options(
    model: Option<&ChatModel>,
    settings: &crate::settings::ClientSettings,
) -> SendOptions {
    match model {
        Some(model) => {
            let overrides = settings.overrides_for(&model.id);
            SendOptions {
                model: Some(effective_model_id(model, &overrides)),
                use_reasoning: should_use_reasoning(model, &overrides),
            }
        }
        None => SendOptions::default(),
    }
}

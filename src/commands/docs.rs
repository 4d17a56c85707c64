//! Document tree commands

use colored::Colorize;
use prettytable::{row, Table};
use tokio::sync::mpsc;

use crate::api::documents::DocumentClient;
use crate::cli::DocsCommand;
use crate::config::Config;
use crate::error::{Result, TextlyError};
use crate::workspace::realtime::RealtimeSubscription;
use crate::workspace::tree::{build_tree, can_move, TreeNode};

/// Dispatches a `docs` subcommand
pub async fn run_docs(config: Config, command: DocsCommand) -> Result<()> {
    let api = super::api_client(&config, true)?;
    let client = DocumentClient::new(api.clone());

    match command {
        DocsCommand::Tree => {
            let records = client.list_all().await?;
            let tree = build_tree(&records);
            if tree.is_empty() {
                println!("Workspace is empty");
            } else {
                for node in &tree {
                    print_node(node, 0);
                }
            }
            Ok(())
        }
        DocsCommand::List => {
            let records = client.list_all().await?;
            let mut table = Table::new();
            table.add_row(row!["ID", "Title", "Kind", "Parent", "Updated"]);
            for record in &records {
                table.add_row(row![
                    record.id,
                    record.title,
                    if record.is_folder { "folder" } else { "document" },
                    record.parent_id().unwrap_or("-"),
                    record.updated,
                ]);
            }
            table.printstd();
            Ok(())
        }
        DocsCommand::Create {
            title,
            parent,
            folder,
        } => {
            let record = client
                .create(&title, "", parent.as_deref(), folder)
                .await?;
            println!(
                "Created {} {} ({})",
                if folder { "folder" } else { "document" },
                record.title.bold(),
                record.id
            );
            Ok(())
        }
        DocsCommand::Move { id, into } => {
            // Validate against the current tree before touching the
            // backend; a rejected move changes nothing anywhere.
            let records = client.list_all().await?;
            if !can_move(&records, &id, into.as_deref()) {
                return Err(TextlyError::Workspace(format!(
                    "cannot move '{}' into '{}': target is the record itself or one of its descendants",
                    id,
                    into.as_deref().unwrap_or("-"),
                ))
                .into());
            }
            let record = client.move_to(&id, into.as_deref()).await?;
            match record.parent_id() {
                Some(parent) => println!("Moved {} into {}", record.title.bold(), parent),
                None => println!("Moved {} to the root", record.title.bold()),
            }
            Ok(())
        }
        DocsCommand::Rm { id } => {
            client.delete(&id).await?;
            println!("Deleted {}", id);
            Ok(())
        }
        DocsCommand::Watch => {
            let retry = std::time::Duration::from_secs(config.realtime.retry_seconds);
            let subscription = RealtimeSubscription::new(api, retry);
            let cancel = subscription.cancel_token();
            let (tx, mut rx) = mpsc::unbounded_channel();

            let runner = tokio::spawn(async move { subscription.run(tx).await });

            println!("Watching document changes (Ctrl-C to stop)\n");
            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        cancel.cancel();
                        break;
                    }
                    event = rx.recv() => {
                        match event {
                            Some(event) => println!(
                                "{:>7} {} {}",
                                event.action.cyan(),
                                event.record.id.yellow(),
                                event.record.title
                            ),
                            None => break,
                        }
                    }
                }
            }

            let _ = runner.await;
            Ok(())
        }
    }
}

/// Prints one tree node with two-space indentation per level
fn print_node(node: &TreeNode, depth: usize) {
    let indent = "  ".repeat(depth);
    if node.record.is_folder {
        println!("{}{}/", indent, node.record.title.blue().bold());
    } else {
        println!("{}{}", indent, node.record.title);
    }
    for child in &node.children {
        print_node(child, depth + 1);
    }
}

//! Command-line interface definition for Textly
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for chat, document management, models, quick
//! actions, and authentication.

use clap::{Parser, Subcommand};

/// Textly - terminal client for the Textly markdown workspace
///
/// Chat with the AI assistant, manage the document tree, and run quick
/// text actions against the workspace backend.
#[derive(Parser, Debug, Clone)]
#[command(name = "textly")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Override the backend base URL from config
    #[arg(long)]
    pub server: Option<String>,

    /// Bearer token (falls back to config, then TEXTLY_TOKEN, then the
    /// OS keyring)
    #[arg(long, env = "TEXTLY_TOKEN")]
    pub token: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Textly
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive chat session
    Chat {
        /// Resume a conversation by id
        #[arg(short, long)]
        resume: Option<String>,

        /// Override the selected model for this session
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Manage documents and folders
    Docs {
        /// Document subcommand
        #[command(subcommand)]
        command: DocsCommand,
    },

    /// Manage AI models
    Models {
        /// Model subcommand
        #[command(subcommand)]
        command: ModelsCommand,
    },

    /// Run a quick text action
    Assist {
        /// Quick action subcommand
        #[command(subcommand)]
        command: AssistCommand,
    },

    /// Log in and cache the backend token
    Auth {
        /// Login identity (email); falls back to config
        #[arg(short, long)]
        identity: Option<String>,
    },
}

/// Document management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum DocsCommand {
    /// Print the folder tree
    Tree,

    /// List all records in a table
    List,

    /// Create a document or folder
    Create {
        /// Record title
        title: String,

        /// Parent folder id
        #[arg(long)]
        parent: Option<String>,

        /// Create a folder instead of a document
        #[arg(long)]
        folder: bool,
    },

    /// Move a record into a folder (omit --into for the root)
    Move {
        /// Record id to move
        id: String,

        /// Target folder id
        #[arg(long)]
        into: Option<String>,
    },

    /// Delete a record
    Rm {
        /// Record id to delete
        id: String,
    },

    /// Follow the realtime document feed
    Watch,
}

/// Model management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ModelsCommand {
    /// List available models
    List {
        /// Print raw JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Select the model used for chat
    Select {
        /// Model identifier
        model: String,
    },

    /// Show the selected model and its effective id
    Current,
}

/// Quick action subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum AssistCommand {
    /// Improve the selected text
    Improve {
        /// The selected text
        text: String,

        /// Surrounding document text
        #[arg(long)]
        context: Option<String>,
    },

    /// Suggest synonyms for the selected text
    Synonyms {
        /// The selected text
        text: String,

        /// Surrounding document text
        #[arg(long)]
        context: Option<String>,
    },

    /// Describe the selected text
    Describe {
        /// The selected text
        text: String,

        /// Surrounding document text
        #[arg(long)]
        context: Option<String>,
    },
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_chat_command() {
        let cli = Cli::try_parse_from(["textly", "chat"]).unwrap();
        assert!(matches!(cli.command, Commands::Chat { .. }));
    }

    #[test]
    fn test_cli_parse_chat_with_resume() {
        let cli = Cli::try_parse_from(["textly", "chat", "--resume", "c1"]).unwrap();
        if let Commands::Chat { resume, model } = cli.command {
            assert_eq!(resume.as_deref(), Some("c1"));
            assert!(model.is_none());
        } else {
            panic!("Expected Chat command");
        }
    }

    #[test]
    fn test_cli_parse_global_overrides() {
        let cli = Cli::try_parse_from([
            "textly",
            "--server",
            "http://other:9000",
            "--token",
            "tok",
            "chat",
        ])
        .unwrap();
        assert_eq!(cli.server.as_deref(), Some("http://other:9000"));
        assert_eq!(cli.token.as_deref(), Some("tok"));
    }

    #[test]
    fn test_cli_parse_docs_tree() {
        let cli = Cli::try_parse_from(["textly", "docs", "tree"]).unwrap();
        if let Commands::Docs { command } = cli.command {
            assert!(matches!(command, DocsCommand::Tree));
        } else {
            panic!("Expected Docs command");
        }
    }

    #[test]
    fn test_cli_parse_docs_move() {
        let cli = Cli::try_parse_from(["textly", "docs", "move", "d1", "--into", "f1"]).unwrap();
        if let Commands::Docs {
            command: DocsCommand::Move { id, into },
        } = cli.command
        {
            assert_eq!(id, "d1");
            assert_eq!(into.as_deref(), Some("f1"));
        } else {
            panic!("Expected Docs move command");
        }
    }

    #[test]
    fn test_cli_parse_docs_create_folder() {
        let cli =
            Cli::try_parse_from(["textly", "docs", "create", "Drafts", "--folder"]).unwrap();
        if let Commands::Docs {
            command: DocsCommand::Create {
                title,
                parent,
                folder,
            },
        } = cli.command
        {
            assert_eq!(title, "Drafts");
            assert!(parent.is_none());
            assert!(folder);
        } else {
            panic!("Expected Docs create command");
        }
    }

    #[test]
    fn test_cli_parse_models_list_json() {
        let cli = Cli::try_parse_from(["textly", "models", "list", "--json"]).unwrap();
        if let Commands::Models {
            command: ModelsCommand::List { json },
        } = cli.command
        {
            assert!(json);
        } else {
            panic!("Expected Models list command");
        }
    }

    #[test]
    fn test_cli_parse_assist_improve() {
        let cli = Cli::try_parse_from([
            "textly",
            "assist",
            "improve",
            "teh quick fox",
            "--context",
            "teh quick fox jumps",
        ])
        .unwrap();
        if let Commands::Assist {
            command: AssistCommand::Improve { text, context },
        } = cli.command
        {
            assert_eq!(text, "teh quick fox");
            assert_eq!(context.as_deref(), Some("teh quick fox jumps"));
        } else {
            panic!("Expected Assist improve command");
        }
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["textly"]).is_err());
    }
}

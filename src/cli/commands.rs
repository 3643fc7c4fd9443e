use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "blvd", version, about = "BLV Dashboard Server", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Override the config file path globally
    #[arg(short, long, global = true, default_value = "config.yaml")]
    pub config: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the dashboard HTTP server
    Serve,

    /// Chat against a conversation from the terminal
    Chat {
        /// The id of the conversation to connect to
        #[arg(short = 'n', long)]
        conversation: i64,
    },

    /// Manage stored conversations
    Conversation {
        #[command(subcommand)]
        action: ConversationAction,
    },
}

#[derive(Subcommand)]
pub enum ConversationAction {
    /// Create a new conversation
    Create {
        #[arg(short, long, default_value = "New Conversation")]
        title: String,
    },

    /// List all conversations
    List,

    /// Delete a conversation and its messages
    Delete { id: i64 },

    /// Export a conversation transcript to a .txt file
    Export {
        /// The id of the conversation to export
        id: i64,
        /// The path to the output file (optional)
        #[arg(short, long)]
        path: Option<String>,
    },
}

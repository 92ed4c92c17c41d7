//! CLI command definitions and dispatch for the `gmind` binary.
//!
//! Uses clap derive macros for argument parsing. Every command takes the
//! conversation id as its first positional argument.

pub mod chat;
pub mod context;
pub mod forget;
pub mod history;
pub mod output;
pub mod reindex;
pub mod reply;
pub mod web;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Group-chat reply engine with conversational memory and web tools.
#[derive(Parser)]
#[command(name = "gmind", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Detailed logs (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Keep history and vectors in memory; nothing is written to disk.
    #[arg(long, global = true)]
    pub ephemeral: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Interactive console chat in one conversation.
    Chat {
        /// Conversation id.
        conversation: String,

        /// Sender handle attached to your messages.
        #[arg(long = "as", value_name = "HANDLE")]
        sender: Option<String>,

        /// Treat the conversation as a one-to-one chat (always reply).
        #[arg(long)]
        private: bool,
    },

    /// Send one message and print the reply.
    Reply {
        /// Conversation id.
        conversation: String,

        /// Message text.
        text: String,

        /// Sender handle attached to the message.
        #[arg(long = "as", value_name = "HANDLE")]
        sender: Option<String>,

        /// Treat the conversation as a one-to-one chat (always reply).
        #[arg(long)]
        private: bool,
    },

    /// Show recent messages of a conversation.
    History {
        /// Conversation id.
        conversation: String,

        /// Maximum messages to display.
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Show the context the model would see for a query.
    Context {
        /// Conversation id.
        conversation: String,

        /// Query text to retrieve against.
        query: String,
    },

    /// Re-embed the recent history of a conversation.
    Reindex {
        /// Conversation id.
        conversation: String,

        /// Messages per chunk (defaults to `indexing.window_size`).
        #[arg(long)]
        window: Option<usize>,
    },

    /// Run the web tools directly.
    Web {
        #[command(subcommand)]
        action: web::WebCommand,
    },

    /// Delete a conversation's messages and vectors.
    #[command(alias = "rm")]
    Forget {
        /// Conversation id.
        conversation: String,

        /// Skip the confirmation prompt.
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

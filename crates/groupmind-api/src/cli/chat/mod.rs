//! Interactive console transport.
//!
//! Every submitted line becomes an inbound message for the conversation and
//! goes through the same `ConversationDispatcher` a chat platform adapter
//! would use. Replies arrive asynchronously through a `ConsoleSink` bound to
//! the readline `SharedWriter`, so the prompt stays usable while the model
//! is thinking.

pub mod banner;
pub mod commands;
pub mod input;

use std::sync::Arc;

use console::style;
use futures_util::future::join_all;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use groupmind_core::reply::dispatcher::ConversationDispatcher;
use groupmind_types::message::ReplyOutcome;

use self::banner::print_welcome_banner;
use self::commands::ChatCommand;
use self::input::{ChatInput, InputEvent};
use super::output::{ConsoleSink, message_table};
use super::reply::inbound;
use crate::state::AppState;

const DEFAULT_HISTORY: usize = 20;

fn prompt(sender: Option<&str>, private: bool) -> String {
    let who = sender.unwrap_or("you");
    let mode = if private { " (private)" } else { "" };
    format!("  {} ", style(format!("{who}{mode} >")).green().bold())
}

/// Run the console chat loop for one conversation.
pub async fn run_chat_loop(
    state: &AppState,
    conversation: &str,
    mut sender: Option<String>,
    mut private: bool,
    json: bool,
) -> anyhow::Result<()> {
    let storage = if state.ephemeral {
        "in-memory (ephemeral)".to_string()
    } else {
        state.data_dir.display().to_string()
    };
    print_welcome_banner(
        conversation,
        &state.config.llm.model,
        &storage,
        state.config.trigger.trigger_on_mention,
    );

    let (mut chat_input, writer) = ChatInput::new(prompt(sender.as_deref(), private))
        .map_err(|e| anyhow::anyhow!("Failed to initialize input: {e}"))?;

    let dispatcher = ConversationDispatcher::new(
        state.orchestrator.clone(),
        state.trigger_policy(),
        Arc::new(ConsoleSink::new(Box::new(writer), json)),
    );
    let mut pending: Vec<JoinHandle<ReplyOutcome>> = Vec::new();

    loop {
        match chat_input.read_line().await {
            InputEvent::Eof => break,
            InputEvent::Interrupted => {
                println!("  {}", style("Press Ctrl+D to exit, or keep chatting.").dim());
                continue;
            }
            InputEvent::Message(text) => {
                if text.is_empty() {
                    continue;
                }

                if let Some(cmd) = commands::parse(&text) {
                    match cmd {
                        ChatCommand::Help => commands::print_help(),
                        ChatCommand::Clear => chat_input.clear(),
                        ChatCommand::Exit => break,
                        ChatCommand::History(limit) => {
                            let limit = limit.unwrap_or(DEFAULT_HISTORY);
                            match state.log.recent(conversation, limit).await {
                                Ok(messages) => println!("\n{}\n", message_table(&messages)),
                                Err(e) => println!("  {} {e}", style("!").red().bold()),
                            }
                        }
                        ChatCommand::As(handle) => {
                            sender = handle;
                            chat_input.update_prompt(&prompt(sender.as_deref(), private));
                        }
                        ChatCommand::Private => {
                            private = !private;
                            chat_input.update_prompt(&prompt(sender.as_deref(), private));
                        }
                        ChatCommand::Unknown(name) => println!(
                            "  {} Unknown command: {}. Type /help for available commands.",
                            style("?").yellow().bold(),
                            style(name).dim()
                        ),
                    }
                    continue;
                }

                pending.retain(|handle| !handle.is_finished());
                let message = inbound(conversation, &text, sender.as_deref(), private);
                pending.push(dispatcher.dispatch(message));
            }
        }
    }

    if !pending.is_empty() {
        debug!(pending = pending.len(), "waiting for in-flight replies");
    }
    for result in join_all(pending).await {
        if let Err(e) = result {
            warn!(error = %e, "reply task failed");
        }
    }
    chat_input.flush();
    println!("\n  {}", style("Chat ended.").dim());
    Ok(())
}

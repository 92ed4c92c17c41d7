//! Single-shot `gmind reply`.

use std::sync::Arc;

use anyhow::Result;
use console::style;

use groupmind_core::reply::dispatcher::ConversationDispatcher;
use groupmind_types::message::{InboundMessage, ReplyOutcome};

use super::output::{ConsoleSink, spinner};
use crate::state::AppState;

/// Build the inbound message for console transports.
pub fn inbound(conversation: &str, text: &str, sender: Option<&str>, private: bool) -> InboundMessage {
    let mut message = InboundMessage::new(conversation, text);
    if let Some(handle) = sender {
        message = message.with_sender(handle);
    }
    if private {
        message = message.private();
    }
    message
}

/// Dispatch one message and wait for the outcome.
///
/// The reply itself is printed by the sink; a skip prints `(no reply)`.
pub async fn reply(
    state: &AppState,
    conversation: &str,
    text: &str,
    sender: Option<&str>,
    private: bool,
    json: bool,
) -> Result<()> {
    let mut sink = ConsoleSink::stdout(json);
    let thinking = (!json).then(|| spinner("thinking..."));
    if let Some(spinner) = &thinking {
        sink = sink.with_spinner(spinner.clone());
    }
    let dispatcher = ConversationDispatcher::new(
        state.orchestrator.clone(),
        state.trigger_policy(),
        Arc::new(sink),
    );

    let outcome = dispatcher
        .handle(inbound(conversation, text, sender, private))
        .await;
    if let Some(spinner) = thinking {
        spinner.finish_and_clear();
    }

    if outcome == ReplyOutcome::NoReply {
        if json {
            println!(
                "{}",
                serde_json::json!({ "conversation_id": conversation, "reply": null })
            );
        } else {
            println!("  {}", style("(no reply)").dim());
        }
    }

    Ok(())
}

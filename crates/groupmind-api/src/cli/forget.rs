//! `gmind forget`: delete a conversation's history and vectors.

use anyhow::Result;
use console::style;
use dialoguer::Confirm;

use groupmind_core::memory::vector::collection_name;

use crate::state::AppState;

pub async fn forget(state: &AppState, conversation: &str, force: bool, json: bool) -> Result<()> {
    let count = state.log.count(conversation).await?;

    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Permanently delete {count} messages and all vectors of '{}'?",
                style(conversation).red().bold()
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    let deleted = state.log.delete_conversation(conversation).await?;
    state.index.delete_collection(&collection_name(conversation)).await?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "conversation_id": conversation, "deleted_messages": deleted })
        );
    } else {
        println!(
            "  {} Forgot '{}' ({} messages).",
            style("✓").red().bold(),
            conversation,
            deleted
        );
    }
    Ok(())
}

//! `gmind history`: recent messages of a conversation.

use anyhow::Result;

use super::output::print_messages;
use crate::state::AppState;

pub async fn history(state: &AppState, conversation: &str, limit: usize, json: bool) -> Result<()> {
    let messages = state.log.recent(conversation, limit).await?;
    print_messages(&format!("History of '{conversation}'"), &messages, json)
}

//! `gmind reindex`: run one synchronous chunk indexing pass.

use anyhow::{Result, bail};
use console::style;

use super::output::spinner;
use crate::state::AppState;

pub async fn reindex(state: &AppState, conversation: &str, window: Option<usize>, json: bool) -> Result<()> {
    let window = window.unwrap_or(state.config.indexing.window_size);
    if window == 0 {
        bail!("--window must be at least 1");
    }

    let progress = (!json).then(|| spinner("embedding recent history..."));
    let result = state.indexer.try_reindex_recent(conversation, window).await;
    if let Some(progress) = progress {
        progress.finish_and_clear();
    }
    let report = result?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "conversation_id": conversation,
                "window_size": window,
                "report": report,
            })
        );
        return Ok(());
    }

    println!();
    if report.messages == 0 {
        println!(
            "  {} Nothing to index for '{}' (no messages, or embeddings not configured).",
            style("-").dim(),
            conversation
        );
    } else {
        println!(
            "  {} Indexed '{}': {} messages in {} chunks of up to {}.",
            style("✓").green().bold(),
            style(conversation).cyan(),
            report.messages,
            report.upserted,
            window
        );
    }
    println!();
    Ok(())
}

//! `gmind context`: the hybrid retrieval result for a query.
//!
//! Shows exactly what the reply engine would feed the model as history when
//! `reply.enable_rag` is on.

use anyhow::Result;

use super::output::{print_messages, spinner};
use crate::state::AppState;

pub async fn context(state: &AppState, conversation: &str, query: &str, json: bool) -> Result<()> {
    let retrieval = &state.config.retrieval;

    let progress = (!json).then(|| spinner("retrieving..."));
    let result = state
        .retriever
        .build_context(
            conversation,
            query,
            retrieval.recent_messages,
            retrieval.similar_limit,
        )
        .await;
    if let Some(progress) = progress {
        progress.finish_and_clear();
    }

    print_messages(&format!("Context for \"{query}\""), &result?, json)
}

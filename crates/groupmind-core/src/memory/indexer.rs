//! Chunk indexing of recent conversation history.
//!
//! `ChunkIndexer` reads the last `3 × window` messages of a conversation,
//! partitions them into contiguous windows, embeds each window's flattened
//! text and upserts it into the conversation's vector collection.
//!
//! A pass does not remember what earlier passes indexed. Overlapping windows
//! are re-embedded and inserted under fresh ids on every call, so a
//! collection accumulates near-duplicate vectors over time. Retrieval dedups
//! by message id, which keeps this harmless for context building.

use std::sync::Arc;

use groupmind_types::error::{EmbeddingError, IndexError, RepositoryError};
use groupmind_types::memory::{ChunkPayload, IndexReport};
use groupmind_types::message::Message;
use tracing::{Instrument, debug, error, info_span};
use uuid::Uuid;

use super::box_embedder::BoxEmbedder;
use super::box_vector::BoxVectorIndex;
use super::vector::collection_name;
use crate::history::box_log::BoxMessageLog;

/// How many windows' worth of history a pass re-reads.
const LOOKBACK_WINDOWS: usize = 3;

/// Errors that stop an indexing pass.
#[derive(Debug, thiserror::Error)]
pub enum IndexingError {
    #[error("failed to read history: {0}")]
    History(#[from] RepositoryError),

    #[error("failed to embed chunks: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("vector index rejected chunk: {0}")]
    Index(#[from] IndexError),
}

/// Splits messages into contiguous windows of `window_size`.
///
/// The final window may be shorter. A window size of 0 is treated as 1.
pub fn partition_windows(messages: &[Message], window_size: usize) -> Vec<&[Message]> {
    messages.chunks(window_size.max(1)).collect()
}

/// Flatten a window into its chunk payload.
///
/// Text is `sender: content` per message joined by newlines, sender handles
/// are the distinct handles in first-appearance order, and `created_at` is
/// the last message's timestamp. Returns `None` for an empty window.
pub fn build_chunk_payload(window: &[Message]) -> Option<ChunkPayload> {
    let last = window.last()?;

    let chunk_text = window
        .iter()
        .map(|m| format!("{}: {}", m.display_sender(), m.content))
        .collect::<Vec<_>>()
        .join("\n");

    let mut sender_handles: Vec<String> = Vec::new();
    for handle in window.iter().filter_map(|m| m.sender_handle.as_deref()) {
        if !handle.trim().is_empty() && !sender_handles.iter().any(|h| h == handle) {
            sender_handles.push(handle.to_string());
        }
    }

    Some(ChunkPayload {
        message_ids: window.iter().map(|m| m.id).collect(),
        chunk_text,
        sender_handles,
        created_at: last.created_at,
    })
}

/// Background indexer for conversation chunks.
///
/// Cheap to clone; all collaborators are shared.
#[derive(Clone)]
pub struct ChunkIndexer {
    log: Arc<BoxMessageLog>,
    embedder: Arc<BoxEmbedder>,
    index: Arc<BoxVectorIndex>,
}

impl ChunkIndexer {
    pub fn new(log: Arc<BoxMessageLog>, embedder: Arc<BoxEmbedder>, index: Arc<BoxVectorIndex>) -> Self {
        Self {
            log,
            embedder,
            index,
        }
    }

    /// Run one indexing pass and report what happened.
    ///
    /// Stops at the first failing window; windows already upserted stay.
    /// An unconfigured embedder makes the pass a no-op.
    pub async fn try_reindex_recent(
        &self,
        conversation_id: &str,
        window_size: usize,
    ) -> Result<IndexReport, IndexingError> {
        let mut report = IndexReport::default();
        if !self.embedder.is_configured() {
            debug!(conversation.id = %conversation_id, "embedder not configured, skipping indexing");
            return Ok(report);
        }

        let window_size = window_size.max(1);
        let messages = self
            .log
            .recent(conversation_id, window_size * LOOKBACK_WINDOWS)
            .await?;
        report.messages = messages.len();
        if messages.is_empty() {
            return Ok(report);
        }

        let payloads: Vec<ChunkPayload> = partition_windows(&messages, window_size)
            .into_iter()
            .filter_map(build_chunk_payload)
            .collect();
        report.windows = payloads.len();

        let texts: Vec<String> = payloads.iter().map(|p| p.chunk_text.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts).await?;
        if vectors.len() != payloads.len() {
            return Err(EmbeddingError::Malformed(format!(
                "expected {} embeddings, got {}",
                payloads.len(),
                vectors.len()
            ))
            .into());
        }

        let collection = collection_name(conversation_id);
        self.index
            .ensure_collection(&collection, self.embedder.dimension())
            .await?;

        for (payload, vector) in payloads.iter().zip(vectors.iter()) {
            self.index
                .upsert(&collection, Uuid::new_v4(), vector, payload)
                .await?;
            report.upserted += 1;
        }

        debug!(
            conversation.id = %conversation_id,
            messages = report.messages,
            windows = report.windows,
            "indexed recent history"
        );
        Ok(report)
    }

    /// Run one indexing pass, logging and swallowing any failure.
    pub async fn reindex_recent(&self, conversation_id: &str, window_size: usize) -> IndexReport {
        match self.try_reindex_recent(conversation_id, window_size).await {
            Ok(report) => report,
            Err(e) => {
                error!(
                    conversation.id = %conversation_id,
                    error = %e,
                    "chunk indexing failed"
                );
                IndexReport::default()
            }
        }
    }

    /// Fire-and-forget indexing on a detached tokio task.
    pub fn spawn_reindex(&self, conversation_id: &str, window_size: usize) {
        let indexer = self.clone();
        let conversation_id = conversation_id.to_string();
        let span = info_span!("chunk_indexer.reindex", conversation.id = %conversation_id);
        tokio::spawn(
            async move {
                indexer.reindex_recent(&conversation_id, window_size).await;
            }
            .instrument(span),
        );
    }
}

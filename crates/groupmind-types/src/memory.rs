//! Chunk types for the conversation vector index.
//!
//! A chunk is a contiguous window of messages flattened into text and
//! embedded as a single vector. The payload travels alongside the vector so
//! retrieval can map hits back to message ids.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata stored next to a chunk vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkPayload {
    pub message_ids: Vec<i64>,
    pub chunk_text: String,
    pub sender_handles: Vec<String>,
    /// Timestamp of the window's last message.
    pub created_at: DateTime<Utc>,
}

/// A vector search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub payload: ChunkPayload,
    /// Cosine similarity, higher is closer.
    pub score: f32,
}

/// Outcome of one indexing pass over a conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexReport {
    /// Messages read from the log for this pass.
    pub messages: usize,
    /// Windows the messages were partitioned into.
    pub windows: usize,
    /// Windows embedded and upserted successfully.
    pub upserted: usize,
}

//! Vector index trait.
//!
//! Defines the interface for per-conversation chunk collections searched by
//! cosine similarity. Implementations (e.g., LanceDB) live in groupmind-infra.

use std::sync::Arc;

use groupmind_types::error::IndexError;
use groupmind_types::memory::{ChunkPayload, ScoredChunk};
use uuid::Uuid;

/// Trait for vector-indexed chunk storage with semantic search.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
/// Each collection has a fixed dimensionality; a vector of any other length
/// must be rejected with [`IndexError::DimensionMismatch`].
pub trait VectorIndex: Send + Sync {
    /// Create the collection if it does not exist yet.
    ///
    /// Fails with `DimensionMismatch` if it exists with another dimension.
    fn ensure_collection(
        &self,
        name: &str,
        dimension: usize,
    ) -> impl std::future::Future<Output = Result<(), IndexError>> + Send;

    /// Insert a point. Ids are caller-chosen; nothing is deduplicated.
    fn upsert(
        &self,
        collection: &str,
        id: Uuid,
        vector: &[f32],
        payload: &ChunkPayload,
    ) -> impl std::future::Future<Output = Result<(), IndexError>> + Send;

    /// The `limit` nearest points, highest cosine similarity first.
    ///
    /// Returns `CollectionNotFound` when the collection was never created.
    fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
    ) -> impl std::future::Future<Output = Result<Vec<ScoredChunk>, IndexError>> + Send;

    /// Drop a collection. Deleting a missing collection is not an error.
    fn delete_collection(
        &self,
        name: &str,
    ) -> impl std::future::Future<Output = Result<(), IndexError>> + Send;
}

/// Shared indexes forward to the inner implementation.
impl<T: VectorIndex> VectorIndex for Arc<T> {
    fn ensure_collection(
        &self,
        name: &str,
        dimension: usize,
    ) -> impl std::future::Future<Output = Result<(), IndexError>> + Send {
        (**self).ensure_collection(name, dimension)
    }

    fn upsert(
        &self,
        collection: &str,
        id: Uuid,
        vector: &[f32],
        payload: &ChunkPayload,
    ) -> impl std::future::Future<Output = Result<(), IndexError>> + Send {
        (**self).upsert(collection, id, vector, payload)
    }

    fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
    ) -> impl std::future::Future<Output = Result<Vec<ScoredChunk>, IndexError>> + Send {
        (**self).search(collection, vector, limit)
    }

    fn delete_collection(
        &self,
        name: &str,
    ) -> impl std::future::Future<Output = Result<(), IndexError>> + Send {
        (**self).delete_collection(name)
    }
}

/// Collection name for a conversation.
///
/// ASCII alphanumerics and `-` are kept as is, so platform chat ids like
/// `-100123` stay readable. Every other byte, `_` included, is written as
/// `_xx` (lowercase hex), which keeps distinct ids on distinct collections.
pub fn collection_name(conversation_id: &str) -> String {
    let mut name = String::from("conversation_");
    for byte in conversation_id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            name.push(char::from(byte));
        } else {
            name.push_str(&format!("_{byte:02x}"));
        }
    }
    name
}

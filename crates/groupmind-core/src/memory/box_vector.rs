//! BoxVectorIndex -- object-safe dynamic dispatch wrapper for VectorIndex.
//!
//! Follows the same blanket-impl pattern as BoxEmbedder:
//! 1. Define an object-safe `VectorIndexDyn` trait with boxed futures
//! 2. Blanket-impl `VectorIndexDyn` for all `T: VectorIndex`
//! 3. `BoxVectorIndex` wraps `Box<dyn VectorIndexDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use groupmind_types::error::IndexError;
use groupmind_types::memory::{ChunkPayload, ScoredChunk};
use uuid::Uuid;

use super::vector::VectorIndex;

/// Object-safe version of [`VectorIndex`] with boxed futures.
pub trait VectorIndexDyn: Send + Sync {
    fn ensure_collection_boxed<'a>(
        &'a self,
        name: &'a str,
        dimension: usize,
    ) -> Pin<Box<dyn Future<Output = Result<(), IndexError>> + Send + 'a>>;

    fn upsert_boxed<'a>(
        &'a self,
        collection: &'a str,
        id: Uuid,
        vector: &'a [f32],
        payload: &'a ChunkPayload,
    ) -> Pin<Box<dyn Future<Output = Result<(), IndexError>> + Send + 'a>>;

    fn search_boxed<'a>(
        &'a self,
        collection: &'a str,
        vector: &'a [f32],
        limit: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<ScoredChunk>, IndexError>> + Send + 'a>>;

    fn delete_collection_boxed<'a>(
        &'a self,
        name: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<(), IndexError>> + Send + 'a>>;
}

/// Blanket implementation: any `VectorIndex` automatically implements `VectorIndexDyn`.
impl<T: VectorIndex> VectorIndexDyn for T {
    fn ensure_collection_boxed<'a>(
        &'a self,
        name: &'a str,
        dimension: usize,
    ) -> Pin<Box<dyn Future<Output = Result<(), IndexError>> + Send + 'a>> {
        Box::pin(self.ensure_collection(name, dimension))
    }

    fn upsert_boxed<'a>(
        &'a self,
        collection: &'a str,
        id: Uuid,
        vector: &'a [f32],
        payload: &'a ChunkPayload,
    ) -> Pin<Box<dyn Future<Output = Result<(), IndexError>> + Send + 'a>> {
        Box::pin(self.upsert(collection, id, vector, payload))
    }

    fn search_boxed<'a>(
        &'a self,
        collection: &'a str,
        vector: &'a [f32],
        limit: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<ScoredChunk>, IndexError>> + Send + 'a>> {
        Box::pin(self.search(collection, vector, limit))
    }

    fn delete_collection_boxed<'a>(
        &'a self,
        name: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<(), IndexError>> + Send + 'a>> {
        Box::pin(self.delete_collection(name))
    }
}

/// Type-erased vector index for runtime backend selection.
pub struct BoxVectorIndex {
    inner: Box<dyn VectorIndexDyn + Send + Sync>,
}

impl BoxVectorIndex {
    /// Wrap a concrete `VectorIndex` in a type-erased box.
    pub fn new<T: VectorIndex + 'static>(index: T) -> Self {
        Self {
            inner: Box::new(index),
        }
    }

    pub async fn ensure_collection(&self, name: &str, dimension: usize) -> Result<(), IndexError> {
        self.inner.ensure_collection_boxed(name, dimension).await
    }

    pub async fn upsert(
        &self,
        collection: &str,
        id: Uuid,
        vector: &[f32],
        payload: &ChunkPayload,
    ) -> Result<(), IndexError> {
        self.inner.upsert_boxed(collection, id, vector, payload).await
    }

    pub async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredChunk>, IndexError> {
        self.inner.search_boxed(collection, vector, limit).await
    }

    pub async fn delete_collection(&self, name: &str) -> Result<(), IndexError> {
        self.inner.delete_collection_boxed(name).await
    }
}

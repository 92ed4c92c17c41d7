//! LanceDB-backed implementation of `VectorIndex`.
//!
//! One table per conversation collection, searched by cosine distance.
//! Payload lists are stored as JSON strings next to the vector.

use std::sync::Arc;

use arrow_array::{
    Array, FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator, StringArray,
};
use arrow_schema::{DataType, Field};
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use groupmind_core::memory::vector::VectorIndex;
use groupmind_types::error::IndexError;
use groupmind_types::memory::{ChunkPayload, ScoredChunk};
use lancedb::query::{ExecutableQuery, QueryBase};
use tracing::debug;
use uuid::Uuid;

use super::lance::LanceVectorStore;
use super::schema::{VECTOR_COLUMN, chunk_schema, vector_dimension};

/// Chunk collections stored as LanceDB tables.
pub struct LanceChunkIndex {
    store: LanceVectorStore,
}

impl LanceChunkIndex {
    pub fn new(store: LanceVectorStore) -> Self {
        Self { store }
    }

    /// Open an existing collection and verify its vector width.
    async fn open_checked(&self, collection: &str, dimension: usize) -> Result<lancedb::Table, IndexError> {
        let table = self
            .store
            .open_table(collection)
            .await
            .map_err(backend)?
            .ok_or_else(|| IndexError::CollectionNotFound(collection.to_string()))?;
        check_dimension(&table, dimension).await?;
        Ok(table)
    }

    fn build_record_batch(
        id: Uuid,
        vector: &[f32],
        payload: &ChunkPayload,
    ) -> Result<RecordBatch, IndexError> {
        let dimension = i32::try_from(vector.len())
            .map_err(|_| IndexError::Backend(format!("vector too wide: {}", vector.len())))?;
        let schema = Arc::new(chunk_schema(dimension));

        let message_ids = serde_json::to_string(&payload.message_ids)
            .map_err(|e| IndexError::Backend(format!("serialize message_ids: {e}")))?;
        let sender_handles = serde_json::to_string(&payload.sender_handles)
            .map_err(|e| IndexError::Backend(format!("serialize sender_handles: {e}")))?;

        let values = Float32Array::from(vector.to_vec());
        let field = Arc::new(Field::new("item", DataType::Float32, true));
        let vector_array = FixedSizeListArray::new(field, dimension, Arc::new(values), None);

        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec![id.to_string()])),
                Arc::new(vector_array),
                Arc::new(StringArray::from(vec![message_ids])),
                Arc::new(StringArray::from(vec![payload.chunk_text.clone()])),
                Arc::new(StringArray::from(vec![sender_handles])),
                Arc::new(StringArray::from(vec![payload.created_at.to_rfc3339()])),
            ],
        )
        .map_err(|e| IndexError::Backend(format!("Failed to build record batch: {e}")))
    }

    /// Decode search result rows into scored chunks.
    ///
    /// `_distance` is the cosine distance LanceDB appends to vector search
    /// results; the score is `1 - distance`.
    fn record_batch_to_hits(batch: &RecordBatch) -> Result<Vec<ScoredChunk>, IndexError> {
        let message_ids = string_column(batch, "message_ids")?;
        let chunk_text = string_column(batch, "chunk_text")?;
        let sender_handles = string_column(batch, "sender_handles")?;
        let created_at = string_column(batch, "created_at")?;
        let distance = batch
            .column_by_name("_distance")
            .and_then(|c| c.as_any().downcast_ref::<Float32Array>());

        (0..batch.num_rows())
            .map(|i| {
                let payload = ChunkPayload {
                    message_ids: serde_json::from_str(message_ids.value(i))
                        .map_err(|e| IndexError::Backend(format!("invalid message_ids: {e}")))?,
                    chunk_text: chunk_text.value(i).to_string(),
                    sender_handles: serde_json::from_str(sender_handles.value(i))
                        .map_err(|e| IndexError::Backend(format!("invalid sender_handles: {e}")))?,
                    created_at: DateTime::parse_from_rfc3339(created_at.value(i))
                        .map(|dt| dt.with_timezone(&Utc))
                        .map_err(|e| IndexError::Backend(format!("invalid created_at: {e}")))?,
                };
                let score = 1.0 - distance.map_or(0.0, |d| d.value(i));
                Ok(ScoredChunk { payload, score })
            })
            .collect()
    }
}

fn backend(e: lancedb::Error) -> IndexError {
    IndexError::Backend(e.to_string())
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray, IndexError> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| IndexError::Backend(format!("missing or mistyped column: {name}")))
}

async fn check_dimension(table: &lancedb::Table, expected: usize) -> Result<(), IndexError> {
    let schema = table.schema().await.map_err(backend)?;
    let actual = vector_dimension(&schema)
        .ok_or_else(|| IndexError::Backend(format!("table has no {VECTOR_COLUMN} column")))?;
    if actual != expected {
        return Err(IndexError::DimensionMismatch {
            expected: actual,
            actual: expected,
        });
    }
    Ok(())
}

impl VectorIndex for LanceChunkIndex {
    async fn ensure_collection(&self, name: &str, dimension: usize) -> Result<(), IndexError> {
        let width = i32::try_from(dimension)
            .map_err(|_| IndexError::Backend(format!("dimension too large: {dimension}")))?;
        let table = self
            .store
            .ensure_table(name, Arc::new(chunk_schema(width)))
            .await
            .map_err(backend)?;
        check_dimension(&table, dimension).await
    }

    async fn upsert(
        &self,
        collection: &str,
        id: Uuid,
        vector: &[f32],
        payload: &ChunkPayload,
    ) -> Result<(), IndexError> {
        let table = self.open_checked(collection, vector.len()).await?;

        let batch = Self::build_record_batch(id, vector, payload)?;
        let schema = batch.schema();
        let reader = RecordBatchIterator::new(vec![Ok(batch)], schema);

        table
            .add(reader)
            .execute()
            .await
            .map_err(|e| IndexError::Backend(format!("Failed to add chunk: {e}")))?;

        debug!(collection, chunk.id = %id, "chunk upserted");
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredChunk>, IndexError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let table = self.open_checked(collection, vector.len()).await?;

        let results = table
            .vector_search(vector)
            .map_err(|e| IndexError::Backend(format!("Vector search setup failed: {e}")))?
            .distance_type(lancedb::DistanceType::Cosine)
            .limit(limit)
            .execute()
            .await
            .map_err(|e| IndexError::Backend(format!("Vector search failed: {e}")))?;

        let batches: Vec<RecordBatch> = results
            .try_collect()
            .await
            .map_err(|e| IndexError::Backend(format!("Failed to collect results: {e}")))?;

        let mut hits = Vec::new();
        for batch in batches.iter().filter(|b| b.num_rows() > 0) {
            hits.extend(Self::record_batch_to_hits(batch)?);
        }
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(limit);
        Ok(hits)
    }

    async fn delete_collection(&self, name: &str) -> Result<(), IndexError> {
        self.store.drop_table(name).await.map_err(backend)
    }
}

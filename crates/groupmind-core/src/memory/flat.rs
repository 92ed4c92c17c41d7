//! Brute-force in-memory vector index.
//!
//! Used by `gmind --ephemeral` and by tests. Every search scans the whole
//! collection, which is fine for the few hundred chunks a session produces.

use dashmap::DashMap;
use groupmind_types::error::IndexError;
use groupmind_types::memory::{ChunkPayload, ScoredChunk};
use uuid::Uuid;

use super::vector::VectorIndex;

struct Collection {
    dimension: usize,
    points: Vec<(Uuid, Vec<f32>, ChunkPayload)>,
}

/// [`VectorIndex`] over a `DashMap` of collections.
#[derive(Default)]
pub struct FlatVectorIndex {
    collections: DashMap<String, Collection>,
}

impl FlatVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of points in a collection (0 if it does not exist).
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .get(collection)
            .map(|c| c.points.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }
}

/// Cosine similarity; 0.0 when either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

impl VectorIndex for FlatVectorIndex {
    async fn ensure_collection(&self, name: &str, dimension: usize) -> Result<(), IndexError> {
        let entry = self
            .collections
            .entry(name.to_string())
            .or_insert_with(|| Collection {
                dimension,
                points: Vec::new(),
            });
        if entry.dimension != dimension {
            return Err(IndexError::DimensionMismatch {
                expected: entry.dimension,
                actual: dimension,
            });
        }
        Ok(())
    }

    async fn upsert(
        &self,
        collection: &str,
        id: Uuid,
        vector: &[f32],
        payload: &ChunkPayload,
    ) -> Result<(), IndexError> {
        let mut entry = self
            .collections
            .get_mut(collection)
            .ok_or_else(|| IndexError::CollectionNotFound(collection.to_string()))?;
        if vector.len() != entry.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: entry.dimension,
                actual: vector.len(),
            });
        }
        entry.points.push((id, vector.to_vec(), payload.clone()));
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredChunk>, IndexError> {
        let entry = self
            .collections
            .get(collection)
            .ok_or_else(|| IndexError::CollectionNotFound(collection.to_string()))?;
        if vector.len() != entry.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: entry.dimension,
                actual: vector.len(),
            });
        }

        let mut scored: Vec<ScoredChunk> = entry
            .points
            .iter()
            .map(|(_, v, payload)| ScoredChunk {
                payload: payload.clone(),
                score: cosine_similarity(vector, v),
            })
            .collect();
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(limit);
        Ok(scored)
    }

    async fn delete_collection(&self, name: &str) -> Result<(), IndexError> {
        self.collections.remove(name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn payload(ids: &[i64]) -> ChunkPayload {
        ChunkPayload {
            message_ids: ids.to_vec(),
            chunk_text: String::new(),
            sender_handles: Vec::new(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn search_ranks_by_cosine_descending() {
        let index = FlatVectorIndex::new();
        index.ensure_collection("c", 2).await.unwrap();
        index.upsert("c", Uuid::new_v4(), &[0.0, 1.0], &payload(&[1])).await.unwrap();
        index.upsert("c", Uuid::new_v4(), &[1.0, 0.0], &payload(&[2])).await.unwrap();
        index.upsert("c", Uuid::new_v4(), &[1.0, 1.0], &payload(&[3])).await.unwrap();

        let hits = index.search("c", &[1.0, 0.1], 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].payload.message_ids, vec![2]);
        assert_eq!(hits[1].payload.message_ids, vec![3]);
        assert!(hits[0].score >= hits[1].score);
    }

    #[tokio::test]
    async fn dimension_mismatch_is_rejected() {
        let index = FlatVectorIndex::new();
        index.ensure_collection("c", 3).await.unwrap();

        let err = index
            .upsert("c", Uuid::new_v4(), &[1.0, 0.0], &payload(&[1]))
            .await
            .unwrap_err();
        assert!(matches!(err, IndexError::DimensionMismatch { expected: 3, actual: 2 }));

        let err = index.ensure_collection("c", 4).await.unwrap_err();
        assert!(matches!(err, IndexError::DimensionMismatch { .. }));
    }

    #[tokio::test]
    async fn search_missing_collection_reports_not_found() {
        let index = FlatVectorIndex::new();
        let err = index.search("nope", &[1.0], 5).await.unwrap_err();
        assert!(matches!(err, IndexError::CollectionNotFound(_)));
    }

    #[tokio::test]
    async fn delete_collection_is_idempotent() {
        let index = FlatVectorIndex::new();
        index.ensure_collection("c", 1).await.unwrap();
        index.delete_collection("c").await.unwrap();
        index.delete_collection("c").await.unwrap();
        assert!(index.is_empty("c"));
    }

    #[test]
    fn cosine_of_zero_vector_is_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert!((cosine_similarity(&[2.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
    }
}

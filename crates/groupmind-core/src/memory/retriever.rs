//! Hybrid context retrieval.
//!
//! Blends the recency window of a conversation with messages referenced by
//! the chunks nearest to the query, deduplicated by id and ordered by time.

use std::collections::HashSet;
use std::sync::Arc;

use groupmind_types::error::{IndexError, RepositoryError, RetrievalError};
use groupmind_types::message::Message;
use tracing::{debug, warn};

use super::box_embedder::BoxEmbedder;
use super::box_vector::BoxVectorIndex;
use super::vector::collection_name;
use crate::history::box_log::BoxMessageLog;

/// Builds the message context an LLM sees for an inbound message.
#[derive(Clone)]
pub struct HybridRetriever {
    log: Arc<BoxMessageLog>,
    embedder: Arc<BoxEmbedder>,
    index: Arc<BoxVectorIndex>,
    fallback_limit: usize,
}

impl HybridRetriever {
    pub fn new(
        log: Arc<BoxMessageLog>,
        embedder: Arc<BoxEmbedder>,
        index: Arc<BoxVectorIndex>,
        fallback_limit: usize,
    ) -> Self {
        Self {
            log,
            embedder,
            index,
            fallback_limit,
        }
    }

    /// Recent messages plus semantically related ones, oldest first, unique by id.
    ///
    /// Embedding or vector search failures degrade to
    /// `recent(conversation_id, fallback_limit)`. Only a failure to read the
    /// recency window itself is returned as an error.
    #[tracing::instrument(
        name = "hybrid_retriever.build_context",
        skip(self, query_text),
        fields(conversation.id = %conversation_id)
    )]
    pub async fn build_context(
        &self,
        conversation_id: &str,
        query_text: &str,
        recent_count: usize,
        similar_limit: usize,
    ) -> Result<Vec<Message>, RepositoryError> {
        let recent = self.log.recent(conversation_id, recent_count).await?;

        if !self.embedder.is_configured() || similar_limit == 0 {
            return Ok(recent);
        }

        let recent_ids: HashSet<i64> = recent.iter().map(|m| m.id).collect();
        let related = match self
            .related_messages(conversation_id, query_text, similar_limit, &recent_ids)
            .await
        {
            Ok(related) => related,
            Err(e) => {
                warn!(error = %e, "semantic search failed, using recent messages only");
                if self.fallback_limit == recent_count {
                    return Ok(recent);
                }
                return self.log.recent(conversation_id, self.fallback_limit).await;
            }
        };

        debug!(
            recent = recent.len(),
            related = related.len(),
            "hybrid context assembled"
        );
        Ok(merge_context(recent, related))
    }

    /// Messages referenced by the nearest chunks, excluding `exclude`.
    ///
    /// Ids that resolve to another conversation's messages are dropped.
    async fn related_messages(
        &self,
        conversation_id: &str,
        query_text: &str,
        similar_limit: usize,
        exclude: &HashSet<i64>,
    ) -> Result<Vec<Message>, RetrievalError> {
        let query_vector = self.embedder.embed(query_text).await?;

        let hits = match self
            .index
            .search(&collection_name(conversation_id), &query_vector, similar_limit)
            .await
        {
            Ok(hits) => hits,
            Err(IndexError::CollectionNotFound(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut wanted: Vec<i64> = Vec::new();
        let mut seen: HashSet<i64> = HashSet::new();
        for id in hits.iter().flat_map(|hit| hit.payload.message_ids.iter().copied()) {
            if !exclude.contains(&id) && seen.insert(id) {
                wanted.push(id);
            }
        }
        if wanted.is_empty() {
            return Ok(Vec::new());
        }

        let found = self.log.by_ids(&wanted).await?;
        let total = found.len();
        let scoped: Vec<Message> = found
            .into_iter()
            .filter(|m| m.conversation_id == conversation_id)
            .collect();
        if scoped.len() < total {
            warn!(
                dropped = total - scoped.len(),
                "chunk referenced messages from another conversation"
            );
        }
        Ok(scoped)
    }
}

/// Concatenate, keep the first occurrence of each id, sort by time.
///
/// Equal timestamps fall back to id order so the result is deterministic.
pub fn merge_context(recent: Vec<Message>, related: Vec<Message>) -> Vec<Message> {
    let mut seen: HashSet<i64> = HashSet::new();
    let mut merged: Vec<Message> = recent
        .into_iter()
        .chain(related)
        .filter(|m| seen.insert(m.id))
        .collect();
    merged.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::in_memory::InMemoryMessageLog;
    use crate::history::log::MessageLog;
    use crate::memory::embedder::Embedder;
    use crate::memory::flat::FlatVectorIndex;
    use crate::memory::vector::VectorIndex;
    use chrono::{Duration, Utc};
    use groupmind_types::error::EmbeddingError;
    use groupmind_types::memory::ChunkPayload;
    use groupmind_types::message::Role;
    use uuid::Uuid;

    struct FixedEmbedder {
        fail: bool,
        configured: bool,
    }

    impl Embedder for FixedEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            if self.fail {
                Err(EmbeddingError::Timeout)
            } else {
                Ok(vec![1.0, 0.0])
            }
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }

        fn is_configured(&self) -> bool {
            self.configured
        }

        fn model_name(&self) -> &str {
            "fixed"
        }

        fn dimension(&self) -> usize {
            2
        }
    }

    fn embedder(fail: bool) -> Arc<BoxEmbedder> {
        Arc::new(BoxEmbedder::new(FixedEmbedder {
            fail,
            configured: true,
        }))
    }

    fn message(id: i64, minutes: i64) -> Message {
        Message {
            id,
            conversation_id: "c".to_string(),
            role: Role::User,
            content: format!("m{id}"),
            sender_handle: None,
            created_at: Utc::now() + Duration::minutes(minutes),
        }
    }

    /// Ten messages (ids 1..=10) and a collection whose only chunk
    /// references `chunk_ids`.
    async fn fixture(chunk_ids: &[i64]) -> (Arc<BoxMessageLog>, Arc<FlatVectorIndex>) {
        let log = InMemoryMessageLog::new();
        for i in 1..=10 {
            log.append("c", Role::User, &format!("m{i}"), None).await.unwrap();
        }
        let index = Arc::new(FlatVectorIndex::new());
        index.ensure_collection(&collection_name("c"), 2).await.unwrap();
        index
            .upsert(
                &collection_name("c"),
                Uuid::new_v4(),
                &[1.0, 0.0],
                &ChunkPayload {
                    message_ids: chunk_ids.to_vec(),
                    chunk_text: String::new(),
                    sender_handles: Vec::new(),
                    created_at: Utc::now(),
                },
            )
            .await
            .unwrap();
        (Arc::new(BoxMessageLog::new(log)), index)
    }

    #[tokio::test]
    async fn fetches_only_ids_missing_from_recent_window() {
        let (log, index) = fixture(&[3, 5, 9]).await;
        let retriever =
            HybridRetriever::new(log, embedder(false), Arc::new(BoxVectorIndex::new(index)), 2);

        // recent(2) = {9, 10}; 5 and 3 come from the chunk.
        let context = retriever.build_context("c", "query", 2, 5).await.unwrap();
        let ids: Vec<i64> = context.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![3, 5, 9, 10]);
    }

    #[tokio::test]
    async fn context_never_repeats_an_id() {
        let (log, index) = fixture(&[10, 10, 9, 1, 1]).await;
        let retriever =
            HybridRetriever::new(log, embedder(false), Arc::new(BoxVectorIndex::new(index)), 3);

        let context = retriever.build_context("c", "query", 3, 5).await.unwrap();
        let ids: Vec<i64> = context.iter().map(|m| m.id).collect();
        let unique: HashSet<i64> = ids.iter().copied().collect();
        assert_eq!(ids.len(), unique.len());
        assert_eq!(ids, vec![1, 8, 9, 10]);
    }

    #[tokio::test]
    async fn embedding_failure_falls_back_to_recent() {
        let (log, index) = fixture(&[1]).await;
        let retriever =
            HybridRetriever::new(log, embedder(true), Arc::new(BoxVectorIndex::new(index)), 4);

        let context = retriever.build_context("c", "query", 2, 5).await.unwrap();
        let ids: Vec<i64> = context.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![7, 8, 9, 10]);
    }

    #[tokio::test]
    async fn missing_collection_is_not_a_failure() {
        let (log, _) = fixture(&[]).await;
        let retriever = HybridRetriever::new(
            log,
            embedder(false),
            Arc::new(BoxVectorIndex::new(FlatVectorIndex::new())),
            8,
        );

        let context = retriever.build_context("c", "query", 2, 5).await.unwrap();
        assert_eq!(context.len(), 2);
    }

    #[tokio::test]
    async fn unconfigured_embedder_returns_recent_only() {
        let (log, index) = fixture(&[1, 2]).await;
        let retriever = HybridRetriever::new(
            log,
            Arc::new(BoxEmbedder::new(FixedEmbedder {
                fail: false,
                configured: false,
            })),
            Arc::new(BoxVectorIndex::new(index)),
            2,
        );

        let context = retriever.build_context("c", "query", 2, 5).await.unwrap();
        let ids: Vec<i64> = context.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![9, 10]);
    }

    #[tokio::test]
    async fn related_messages_stay_in_their_conversation() {
        let log = InMemoryMessageLog::new();
        let secret = log.append("a_b", Role::User, "secret from a_b", None).await.unwrap();
        let own = log.append("a.b", Role::User, "hello from a.b", None).await.unwrap();
        let older = log.append("a.b", Role::User, "older in a.b", None).await.unwrap();

        // A chunk in a.b's collection naming an id that belongs to a_b.
        let index = FlatVectorIndex::new();
        index.ensure_collection(&collection_name("a.b"), 2).await.unwrap();
        index
            .upsert(
                &collection_name("a.b"),
                Uuid::new_v4(),
                &[1.0, 0.0],
                &ChunkPayload {
                    message_ids: vec![secret.id, own.id],
                    chunk_text: String::new(),
                    sender_handles: Vec::new(),
                    created_at: Utc::now(),
                },
            )
            .await
            .unwrap();

        let retriever = HybridRetriever::new(
            Arc::new(BoxMessageLog::new(log)),
            embedder(false),
            Arc::new(BoxVectorIndex::new(index)),
            1,
        );
        let context = retriever.build_context("a.b", "q", 1, 5).await.unwrap();

        assert!(context.iter().all(|m| m.conversation_id == "a.b"));
        let ids: Vec<i64> = context.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![own.id, older.id]);
    }

    #[test]
    fn merge_keeps_first_occurrence_and_sorts_by_time() {
        let recent = vec![message(5, 5), message(9, 9)];
        let mut late_duplicate = message(5, 100);
        late_duplicate.content = "duplicate".to_string();
        let related = vec![message(3, 3), late_duplicate];

        let merged = merge_context(recent, related);
        let ids: Vec<i64> = merged.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![3, 5, 9]);
        assert_eq!(merged[1].content, "m5");
    }
}

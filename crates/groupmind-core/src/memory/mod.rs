//! Semantic memory over conversation history.
//!
//! This module defines the `Embedder` and `VectorIndex` traits that the
//! infrastructure layer implements, the `ChunkIndexer` that writes chunk
//! vectors after each turn, and the `HybridRetriever` that reads them back
//! when building reply context.

pub mod box_embedder;
pub mod box_vector;
pub mod embedder;
pub mod flat;
pub mod indexer;
pub mod retriever;
pub mod vector;

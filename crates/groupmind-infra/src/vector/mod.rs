//! Vector database infrastructure for chunk embeddings.
//!
//! Provides LanceDB table management and the `VectorIndex` implementation
//! over it. Arrow schemas define the table structures.

pub mod chunk_index;
pub mod lance;
pub mod schema;

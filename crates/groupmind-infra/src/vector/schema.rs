//! Arrow schema for LanceDB chunk tables.
//!
//! Arrow versions MUST match lancedb's transitive dependency (57.3 for lancedb 0.26).

use std::sync::Arc;

use arrow_schema::{DataType, Field, Schema};

/// Name of the embedding column.
pub const VECTOR_COLUMN: &str = "vector";

/// Schema for a per-conversation chunk table (`conversation_{id}`).
///
/// `message_ids` and `sender_handles` hold JSON arrays; the vector width is
/// fixed per table by the embedding model's dimension.
pub fn chunk_schema(dimension: i32) -> Schema {
    Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new(
            VECTOR_COLUMN,
            DataType::FixedSizeList(
                Arc::new(Field::new("item", DataType::Float32, true)),
                dimension,
            ),
            false,
        ),
        Field::new("message_ids", DataType::Utf8, false),
        Field::new("chunk_text", DataType::Utf8, false),
        Field::new("sender_handles", DataType::Utf8, false),
        Field::new("created_at", DataType::Utf8, false),
    ])
}

/// Vector width declared by a table schema, if it has a vector column.
pub fn vector_dimension(schema: &Schema) -> Option<usize> {
    match schema.field_with_name(VECTOR_COLUMN).ok()?.data_type() {
        DataType::FixedSizeList(_, size) => usize::try_from(*size).ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_schema_has_correct_fields() {
        let schema = chunk_schema(768);
        assert_eq!(schema.fields().len(), 6);
        for name in ["id", "message_ids", "chunk_text", "sender_handles", "created_at"] {
            assert!(schema.field_with_name(name).is_ok(), "{name} missing");
        }
        assert_eq!(vector_dimension(&schema), Some(768));
    }

    #[test]
    fn test_vector_dimension_without_vector_column() {
        let schema = Schema::new(vec![Field::new("id", DataType::Utf8, false)]);
        assert_eq!(vector_dimension(&schema), None);
    }
}

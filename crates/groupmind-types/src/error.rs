use thiserror::Error;

/// Errors from repository operations (used by trait definitions in groupmind-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,
}

/// Errors from the embedding service.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding service is not configured")]
    NotConfigured,

    #[error("cannot embed empty text")]
    EmptyInput,

    #[error("embedding request timed out")]
    Timeout,

    #[error("embedding provider error: {0}")]
    Provider(String),

    #[error("malformed embedding response: {0}")]
    Malformed(String),
}

/// Errors from the vector index.
#[derive(Debug, Error)]
pub enum IndexError {
    /// A vector does not match the collection's fixed dimensionality.
    /// Indicates misconfiguration; callers must stop rather than continue.
    #[error("vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("collection not found: {0}")]
    CollectionNotFound(String),

    #[error("vector index error: {0}")]
    Backend(String),
}

/// Errors from the external web search/fetch provider.
#[derive(Debug, Error)]
pub enum WebProviderError {
    #[error("web request timed out")]
    Timeout,

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Failure of the semantic half of hybrid retrieval.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

//! Embedding service clients.

pub mod ollama;

//! Web search/fetch provider clients.

pub mod ollama;

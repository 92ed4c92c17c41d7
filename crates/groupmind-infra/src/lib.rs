//! Infrastructure layer for groupmind.
//!
//! Contains implementations of the collaborator traits defined in
//! `groupmind-core`: the SQLite message log, the LanceDB chunk index, and
//! HTTP clients for embeddings, chat completions and web search/fetch.

pub mod config;
pub mod embedding;
pub mod llm;
pub mod sqlite;
pub mod vector;
pub mod web;

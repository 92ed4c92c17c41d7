//! Retrieval and reply engine for groupmind.
//!
//! This crate defines the collaborator traits (message log, embedder, vector
//! index, LLM provider, web provider) that the infrastructure layer
//! implements, and the engine built on them. It depends only on
//! `groupmind-types` and the span attribute names in `groupmind-observe`,
//! never on `groupmind-infra` or any database/IO crate.

pub mod clock;
pub mod history;
pub mod llm;
pub mod memory;
pub mod reply;
pub mod tools;

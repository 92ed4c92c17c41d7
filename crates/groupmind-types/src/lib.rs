//! Shared domain types for groupmind.
//!
//! Messages, chunks, LLM wire shapes, web tool records, configuration and
//! the error enums shared by the engine and its adapters.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod config;
pub mod error;
pub mod llm;
pub mod memory;
pub mod message;
pub mod tool;

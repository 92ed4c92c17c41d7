//! Conversation history storage.
//!
//! Defines the `MessageLog` trait the infrastructure layer implements, its
//! type-erased wrapper, and an in-memory implementation.

pub mod box_log;
pub mod in_memory;
pub mod log;

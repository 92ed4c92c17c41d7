//! Web tools the model can call during a reply.
//!
//! `WebToolService` is the entry point; the submodules are its parts:
//! argument decoding, the TTL cache, term-overlap reranking and the
//! provider trait implemented in groupmind-infra.

pub mod cache;
pub mod invocation;
pub mod provider;
pub mod rerank;
pub mod web;

//! LlmProvider trait definition.
//!
//! This is the core abstraction that every chat-completion backend implements.
//! Uses RPITIT for `chat`; `BoxLlmProvider` erases it for runtime selection.

use groupmind_types::llm::{ChatRequest, ChatResponse, LlmError};

/// Trait for LLM chat backends with tool calling.
///
/// Implementations live in groupmind-infra (e.g., `OpenAiCompatProvider`).
/// Each call enforces its own timeout and reports it as [`LlmError::Timeout`].
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "ollama", "openai").
    fn name(&self) -> &str;

    /// Send a chat request and receive the full (non-streamed) response.
    fn chat(
        &self,
        request: &ChatRequest,
    ) -> impl std::future::Future<Output = Result<ChatResponse, LlmError>> + Send;
}

//! Where the system prompt goes in a chat request.
//!
//! Some OpenAI-compatible backends reject a system-role message when tools
//! are declared. The orchestrator starts with [`PromptPlacement::SystemRole`]
//! and, on that specific rejection of the first call, retries exactly once
//! with [`PromptPlacement::UserRole`].

use groupmind_types::llm::{ChatMessage, ChatRequest, LlmError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptPlacement {
    /// `ChatRequest::system_prompt` carries the prompt.
    SystemRole,
    /// The prompt is demoted to a leading user message.
    UserRole,
}

impl PromptPlacement {
    /// The next placement to try after `error`, if any.
    ///
    /// Only the first placement can fall back, so the strategy never loops.
    pub fn fallback_for(self, error: &LlmError) -> Option<PromptPlacement> {
        match self {
            PromptPlacement::SystemRole if is_system_role_rejection(error) => {
                Some(PromptPlacement::UserRole)
            }
            _ => None,
        }
    }

    /// Assemble a request with the prompt placed accordingly.
    pub fn build_request(
        self,
        base: &ChatRequest,
        system_prompt: &str,
        messages: &[ChatMessage],
    ) -> ChatRequest {
        let mut request = base.clone();
        match self {
            PromptPlacement::SystemRole => {
                request.system_prompt = Some(system_prompt.to_string());
                request.messages = messages.to_vec();
            }
            PromptPlacement::UserRole => {
                request.system_prompt = None;
                request.messages = std::iter::once(ChatMessage::user(system_prompt))
                    .chain(messages.iter().cloned())
                    .collect();
            }
        }
        request
    }
}

/// Client error caused by combining a system message with tool declarations.
pub fn is_system_role_rejection(error: &LlmError) -> bool {
    let LlmError::InvalidRequest(body) = error else {
        return false;
    };
    let body = body.to_lowercase();
    body.contains("system message")
        || (body.contains("system")
            && (body.contains("tool") || body.contains("function") || body.contains("role")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_rejection_signature() {
        assert!(is_system_role_rejection(&LlmError::InvalidRequest(
            "System role is not supported with Tools".to_string()
        )));
        assert!(is_system_role_rejection(&LlmError::InvalidRequest(
            "unexpected system message".to_string()
        )));
        assert!(!is_system_role_rejection(&LlmError::InvalidRequest(
            "max_tokens too large".to_string()
        )));
        assert!(!is_system_role_rejection(&LlmError::Provider {
            message: "system role with tools".to_string()
        }));
    }

    #[test]
    fn falls_back_only_once() {
        let err = LlmError::InvalidRequest("system role not allowed with tools".to_string());
        assert_eq!(
            PromptPlacement::SystemRole.fallback_for(&err),
            Some(PromptPlacement::UserRole)
        );
        assert_eq!(PromptPlacement::UserRole.fallback_for(&err), None);
        assert_eq!(PromptPlacement::SystemRole.fallback_for(&LlmError::Timeout), None);
    }

    #[test]
    fn user_role_placement_prepends_prompt() {
        let base = ChatRequest {
            model: "m".to_string(),
            system_prompt: None,
            messages: Vec::new(),
            tools: Vec::new(),
            temperature: None,
        };
        let messages = vec![ChatMessage::user("alice: hi")];

        let system = PromptPlacement::SystemRole.build_request(&base, "be nice", &messages);
        assert_eq!(system.system_prompt.as_deref(), Some("be nice"));
        assert_eq!(system.messages.len(), 1);

        let demoted = PromptPlacement::UserRole.build_request(&base, "be nice", &messages);
        assert!(demoted.system_prompt.is_none());
        assert_eq!(demoted.messages.len(), 2);
        assert_eq!(demoted.messages[0].content, "be nice");
    }
}

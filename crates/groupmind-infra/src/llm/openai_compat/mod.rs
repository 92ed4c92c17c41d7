//! OpenAI-compatible chat completions provider.
//!
//! One [`OpenAiCompatProvider`] serves any server speaking the OpenAI
//! `/chat/completions` protocol with tool calling: Ollama's `/v1` endpoint,
//! vLLM, OpenRouter or OpenAI itself.
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is only exposed
//! when building the `Authorization` header.

pub mod types;

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use groupmind_core::llm::provider::LlmProvider;
use groupmind_types::llm::{ChatMessage, ChatRequest, ChatResponse, ChatRole, LlmError, ToolCall, Usage};

use self::types::{
    OaiFunctionCall, OaiFunctionDecl, OaiMessage, OaiRequest, OaiResponse, OaiTool, OaiToolCall,
};

/// Connection settings for an OpenAI-compatible endpoint.
pub struct OpenAiCompatConfig {
    /// Name reported in spans and logs (e.g., "ollama").
    pub provider_name: String,
    /// Base URL up to and including the version segment, e.g. `http://localhost:11434/v1`.
    pub base_url: String,
    pub api_key: Option<SecretString>,
    /// Used when a request leaves `model` empty.
    pub model: String,
    pub timeout: Duration,
}

/// Chat provider for OpenAI-compatible APIs.
///
/// Does NOT derive Debug so the API key can never end up in logs.
pub struct OpenAiCompatProvider {
    client: reqwest::Client,
    provider_name: String,
    base_url: String,
    api_key: Option<SecretString>,
    model: String,
}

impl OpenAiCompatProvider {
    pub fn new(config: OpenAiCompatConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Provider {
                message: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            provider_name: config.provider_name,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            model: config.model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Convert a generic [`ChatRequest`] into the wire request.
    fn to_oai_request(&self, request: &ChatRequest) -> OaiRequest {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if let Some(system) = &request.system_prompt {
            messages.push(OaiMessage {
                role: ChatRole::System.to_string(),
                content: system.clone(),
                tool_calls: Vec::new(),
                tool_call_id: None,
                name: None,
            });
        }
        messages.extend(request.messages.iter().map(to_oai_message));

        let model = if request.model.is_empty() {
            self.model.clone()
        } else {
            request.model.clone()
        };

        OaiRequest {
            model,
            messages,
            tools: request
                .tools
                .iter()
                .map(|tool| OaiTool {
                    kind: "function",
                    function: OaiFunctionDecl {
                        name: tool.name.clone(),
                        description: tool.description.clone(),
                        parameters: tool.parameters.clone(),
                    },
                })
                .collect(),
            temperature: request.temperature,
            stream: false,
        }
    }
}

fn to_oai_message(message: &ChatMessage) -> OaiMessage {
    OaiMessage {
        role: message.role.to_string(),
        content: message.content.clone(),
        tool_calls: message
            .tool_calls
            .iter()
            .map(|call| OaiToolCall {
                id: call.id.clone(),
                kind: "function",
                function: OaiFunctionCall {
                    name: call.name.clone(),
                    arguments: call.arguments.to_string(),
                },
            })
            .collect(),
        tool_call_id: message.tool_call_id.clone(),
        name: message.tool_name.clone(),
    }
}

/// Map a non-success HTTP status to an [`LlmError`].
///
/// 400/422 keep the response body so callers can inspect why the request
/// was rejected.
pub fn map_status(status: u16, body: String, retry_after_secs: Option<u64>) -> LlmError {
    match status {
        401 | 403 => LlmError::AuthenticationFailed,
        429 => LlmError::RateLimited {
            retry_after_ms: retry_after_secs.map(|s| s * 1000),
        },
        400 | 422 => LlmError::InvalidRequest(body),
        _ => LlmError::Provider {
            message: format!("HTTP {status}: {body}"),
        },
    }
}

/// Convert the wire response into a [`ChatResponse`].
///
/// String-encoded tool arguments are decoded; anything that fails to parse
/// is passed through as a JSON string for the tool layer to reject.
pub fn from_oai_response(response: OaiResponse) -> Result<ChatResponse, LlmError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::Deserialization("response has no choices".to_string()))?;

    let tool_calls = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(i, call)| ToolCall {
            id: call.id.unwrap_or_else(|| format!("call_{i}")),
            name: call.function.name,
            arguments: match call.function.arguments {
                serde_json::Value::String(raw) => serde_json::from_str(&raw)
                    .unwrap_or(serde_json::Value::String(raw)),
                other => other,
            },
        })
        .collect();

    Ok(ChatResponse {
        content: choice.message.content.unwrap_or_default(),
        tool_calls,
        model: response.model,
        usage: response
            .usage
            .map(|u| Usage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default(),
        finish_reason: choice.finish_reason,
    })
}

impl LlmProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.provider_name
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, LlmError> {
        let body = self.to_oai_request(request);
        let url = format!("{}/chat/completions", self.base_url);

        let mut builder = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout
            } else {
                LlmError::Provider {
                    message: format!("HTTP request failed: {e}"),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            let error_body = response.text().await.unwrap_or_default();
            return Err(map_status(status.as_u16(), error_body, retry_after));
        }

        let oai_response: OaiResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout
            } else {
                LlmError::Deserialization(format!("failed to parse response: {e}"))
            }
        })?;

        from_oai_response(oai_response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use groupmind_types::llm::ToolDefinition;
    use serde_json::json;

    fn provider() -> OpenAiCompatProvider {
        OpenAiCompatProvider::new(OpenAiCompatConfig {
            provider_name: "ollama".to_string(),
            base_url: "http://localhost:11434/v1/".to_string(),
            api_key: None,
            model: "llama3.2".to_string(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn test_request_places_system_first_and_serializes_tools() {
        let call = ToolCall {
            id: "call_1".to_string(),
            name: "web_search".to_string(),
            arguments: json!({"query": "rust"}),
        };
        let request = ChatRequest {
            model: String::new(),
            system_prompt: Some("be brief".to_string()),
            messages: vec![
                ChatMessage::user("alice: hi"),
                ChatMessage::assistant_with_tools("", vec![call.clone()]),
                ChatMessage::tool_result(&call, "results"),
            ],
            tools: vec![ToolDefinition {
                name: "web_search".to_string(),
                description: "search".to_string(),
                parameters: json!({"type": "object"}),
            }],
            temperature: Some(0.5),
        };

        let body = serde_json::to_value(provider().to_oai_request(&request)).unwrap();
        assert_eq!(body["model"], "llama3.2");
        assert_eq!(body["stream"], false);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "be brief");
        assert_eq!(body["messages"][2]["tool_calls"][0]["type"], "function");
        assert_eq!(
            body["messages"][2]["tool_calls"][0]["function"]["arguments"],
            r#"{"query":"rust"}"#
        );
        assert_eq!(body["messages"][3]["role"], "tool");
        assert_eq!(body["messages"][3]["tool_call_id"], "call_1");
        assert_eq!(body["tools"][0]["function"]["name"], "web_search");
        assert!(body["messages"][1].get("tool_calls").is_none());
    }

    #[test]
    fn test_request_without_system_or_tools() {
        let request = ChatRequest {
            model: "other".to_string(),
            system_prompt: None,
            messages: vec![ChatMessage::user("hello")],
            tools: Vec::new(),
            temperature: None,
        };
        let body = serde_json::to_value(provider().to_oai_request(&request)).unwrap();
        assert_eq!(body["model"], "other");
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert!(body.get("tools").is_none());
        assert!(body.get("temperature").is_none());
    }

    #[test]
    fn test_response_decodes_string_and_object_arguments() {
        let raw = json!({
            "model": "llama3.2",
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [
                        {"id": "a", "function": {"name": "web_search", "arguments": "{\"query\":\"x\"}"}},
                        {"function": {"name": "web_fetch", "arguments": {"url": "https://a.io"}}}
                    ]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3}
        });
        let response = from_oai_response(serde_json::from_value(raw).unwrap()).unwrap();

        assert_eq!(response.content, "");
        assert_eq!(response.tool_calls.len(), 2);
        assert_eq!(response.tool_calls[0].arguments, json!({"query": "x"}));
        assert_eq!(response.tool_calls[1].id, "call_1");
        assert_eq!(response.tool_calls[1].arguments, json!({"url": "https://a.io"}));
        assert_eq!(response.usage.input_tokens, 12);
        assert_eq!(response.finish_reason.as_deref(), Some("tool_calls"));
    }

    #[test]
    fn test_response_without_choices_is_an_error() {
        let raw = json!({"model": "m", "choices": []});
        let err = from_oai_response(serde_json::from_value(raw).unwrap()).unwrap_err();
        assert!(matches!(err, LlmError::Deserialization(_)));
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(map_status(401, String::new(), None), LlmError::AuthenticationFailed));
        assert!(matches!(map_status(403, String::new(), None), LlmError::AuthenticationFailed));
        assert!(matches!(
            map_status(429, String::new(), Some(2)),
            LlmError::RateLimited { retry_after_ms: Some(2000) }
        ));
        match map_status(400, "system role not supported".to_string(), None) {
            LlmError::InvalidRequest(body) => assert_eq!(body, "system role not supported"),
            other => panic!("expected InvalidRequest, got {other:?}"),
        }
        assert!(matches!(map_status(422, String::new(), None), LlmError::InvalidRequest(_)));
        assert!(matches!(map_status(500, String::new(), None), LlmError::Provider { .. }));
    }
}

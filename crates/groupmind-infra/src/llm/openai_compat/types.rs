//! OpenAI chat completions wire types.
//!
//! These are the HTTP-level structures for `/chat/completions`. They are NOT
//! the provider-agnostic LLM types from groupmind-types.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct OaiRequest {
    pub model: String,
    pub messages: Vec<OaiMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<OaiTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    pub stream: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct OaiMessage {
    pub role: String,
    pub content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<OaiToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OaiTool {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub function: OaiFunctionDecl,
}

#[derive(Debug, Clone, Serialize)]
pub struct OaiFunctionDecl {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Tool call as sent back to the API in an assistant message.
#[derive(Debug, Clone, Serialize)]
pub struct OaiToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub function: OaiFunctionCall,
}

#[derive(Debug, Clone, Serialize)]
pub struct OaiFunctionCall {
    pub name: String,
    /// JSON-encoded arguments, as the API expects.
    pub arguments: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OaiResponse {
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub choices: Vec<OaiChoice>,
    #[serde(default)]
    pub usage: Option<OaiUsage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OaiChoice {
    pub message: OaiResponseMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OaiResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<OaiResponseToolCall>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OaiResponseToolCall {
    #[serde(default)]
    pub id: Option<String>,
    pub function: OaiResponseFunction,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OaiResponseFunction {
    pub name: String,
    /// A JSON string per the OpenAI spec; some servers send an object.
    #[serde(default)]
    pub arguments: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OaiUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
}

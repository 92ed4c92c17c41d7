//! Decoding of model tool calls into typed web tool invocations.
//!
//! Malformed arguments are protocol errors: they are rejected here, before
//! any provider is contacted.

use groupmind_types::llm::{ToolCall, ToolDefinition};
use groupmind_types::tool::{ToolError, ToolName};
use serde_json::{Value, json};

/// A validated web tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebToolInvocation {
    Search {
        query: String,
        max_results: Option<usize>,
    },
    Fetch {
        url: String,
    },
}

impl WebToolInvocation {
    pub fn tool_name(&self) -> ToolName {
        match self {
            WebToolInvocation::Search { .. } => ToolName::WebSearch,
            WebToolInvocation::Fetch { .. } => ToolName::WebFetch,
        }
    }

    pub fn from_call(call: &ToolCall) -> Result<Self, ToolError> {
        let tool: ToolName = call.name.parse()?;
        let args = call.arguments.as_object().ok_or_else(|| ToolError::MalformedArguments {
            tool: call.name.clone(),
            reason: "arguments must be a JSON object".to_string(),
        })?;

        match tool {
            ToolName::WebSearch => {
                let query = required_string(tool, args.get("query"), "query")?;
                let max_results = match args.get("max_results") {
                    None | Some(Value::Null) => None,
                    Some(value) => Some(parse_count(value).ok_or_else(|| {
                        ToolError::MalformedArguments {
                            tool: tool.to_string(),
                            reason: format!("max_results must be a positive integer, got {value}"),
                        }
                    })?),
                };
                Ok(WebToolInvocation::Search { query, max_results })
            }
            ToolName::WebFetch => Ok(WebToolInvocation::Fetch {
                url: required_string(tool, args.get("url"), "url")?,
            }),
        }
    }
}

fn required_string(tool: ToolName, value: Option<&Value>, field: &str) -> Result<String, ToolError> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        Some(Value::String(_)) => Err(ToolError::MalformedArguments {
            tool: tool.to_string(),
            reason: format!("'{field}' must not be empty"),
        }),
        Some(other) => Err(ToolError::MalformedArguments {
            tool: tool.to_string(),
            reason: format!("'{field}' must be a string, got {other}"),
        }),
        None => Err(ToolError::MalformedArguments {
            tool: tool.to_string(),
            reason: format!("missing '{field}'"),
        }),
    }
}

/// Small models often quote numbers, so `"5"` is accepted alongside `5`.
fn parse_count(value: &Value) -> Option<usize> {
    match value {
        Value::Number(n) => n.as_u64().map(|n| n as usize),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Declarations for `web_search` and `web_fetch`.
pub fn web_tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: ToolName::WebSearch.to_string(),
            description: "Search the web for current information. Use it for news, dates, \
                          scores, prices and anything that may have changed recently."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Search query"
                    },
                    "max_results": {
                        "type": "integer",
                        "description": "Number of results to return (1-10, default 5)",
                        "minimum": 1,
                        "maximum": 10
                    }
                },
                "required": ["query"]
            }),
        },
        ToolDefinition {
            name: ToolName::WebFetch.to_string(),
            description: "Fetch the text content of a web page by URL.".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "url": {
                        "type": "string",
                        "description": "Absolute URL of the page"
                    }
                },
                "required": ["url"]
            }),
        },
    ]
}

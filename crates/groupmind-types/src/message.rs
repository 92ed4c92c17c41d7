//! Conversation message types for groupmind.
//!
//! A [`Message`] is one persisted turn in a conversation log. Messages are
//! append-only: once written they are never edited or removed by the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Author role of a persisted conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// A single persisted conversation turn.
///
/// Ids are strictly increasing within a conversation and `created_at` is
/// non-decreasing in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub conversation_id: String,
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_handle: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Handle used when flattening this message into chunk text.
    ///
    /// Falls back to `User` / `Bot` when the transport did not supply one.
    pub fn display_sender(&self) -> &str {
        match self.sender_handle.as_deref() {
            Some(handle) if !handle.trim().is_empty() => handle,
            _ => match self.role {
                Role::User => "User",
                Role::Assistant => "Bot",
            },
        }
    }
}

/// A message delivered by the messaging transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    pub conversation_id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_handle: Option<String>,
    /// Private (1:1) conversations always get a reply attempt.
    #[serde(default)]
    pub is_private: bool,
}

impl InboundMessage {
    pub fn new(conversation_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            text: text.into(),
            sender_handle: None,
            is_private: false,
        }
    }

    pub fn with_sender(mut self, handle: impl Into<String>) -> Self {
        self.sender_handle = Some(handle.into());
        self
    }

    pub fn private(mut self) -> Self {
        self.is_private = true;
        self
    }
}

/// Result of a reply attempt.
///
/// `NoReply` is the explicit signal for the SKIP decision; it is neither an
/// error nor an empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "text", rename_all = "snake_case")]
pub enum ReplyOutcome {
    Reply(String),
    NoReply,
}

impl ReplyOutcome {
    pub fn text(&self) -> Option<&str> {
        match self {
            ReplyOutcome::Reply(text) => Some(text),
            ReplyOutcome::NoReply => None,
        }
    }
}

//! Process-local message log.
//!
//! Backs `gmind --ephemeral` and the engine tests. Ids come from a single
//! counter shared by all conversations, so they are strictly increasing per
//! conversation just like the SQLite autoincrement key.

use std::sync::Mutex;

use chrono::Utc;
use groupmind_types::error::RepositoryError;
use groupmind_types::message::{Message, Role};

use super::log::MessageLog;

#[derive(Debug, Default)]
struct LogState {
    next_id: i64,
    messages: Vec<Message>,
}

/// In-memory [`MessageLog`]. Messages are kept in insertion order.
#[derive(Debug, Default)]
pub struct InMemoryMessageLog {
    state: Mutex<LogState>,
}

impl InMemoryMessageLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MessageLog for InMemoryMessageLog {
    async fn append(
        &self,
        conversation_id: &str,
        role: Role,
        content: &str,
        sender_handle: Option<&str>,
    ) -> Result<Message, RepositoryError> {
        let mut state = self.state.lock().expect("message log lock poisoned");
        state.next_id += 1;

        // Keep created_at non-decreasing even if the wall clock steps back.
        let now = Utc::now();
        let created_at = state
            .messages
            .last()
            .map(|last| last.created_at.max(now))
            .unwrap_or(now);

        let message = Message {
            id: state.next_id,
            conversation_id: conversation_id.to_string(),
            role,
            content: content.to_string(),
            sender_handle: sender_handle.map(str::to_string),
            created_at,
        };
        state.messages.push(message.clone());
        Ok(message)
    }

    async fn recent(&self, conversation_id: &str, limit: usize) -> Result<Vec<Message>, RepositoryError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let state = self.state.lock().expect("message log lock poisoned");
        let mut recent: Vec<Message> = state
            .messages
            .iter()
            .rev()
            .filter(|m| m.conversation_id == conversation_id)
            .take(limit)
            .cloned()
            .collect();
        recent.reverse();
        Ok(recent)
    }

    async fn by_ids(&self, ids: &[i64]) -> Result<Vec<Message>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let state = self.state.lock().expect("message log lock poisoned");
        Ok(state
            .messages
            .iter()
            .filter(|m| ids.contains(&m.id))
            .cloned()
            .collect())
    }

    async fn count(&self, conversation_id: &str) -> Result<u64, RepositoryError> {
        let state = self.state.lock().expect("message log lock poisoned");
        Ok(state
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .count() as u64)
    }

    async fn delete_conversation(&self, conversation_id: &str) -> Result<u64, RepositoryError> {
        let mut state = self.state.lock().expect("message log lock poisoned");
        let before = state.messages.len();
        state.messages.retain(|m| m.conversation_id != conversation_id);
        Ok((before - state.messages.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn append_then_recent_returns_message() {
        let log = InMemoryMessageLog::new();
        log.append("42", Role::User, "hello", Some("alice")).await.unwrap();

        let recent = log.recent("42", 10).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].role, Role::User);
        assert_eq!(recent[0].content, "hello");
        assert_eq!(recent[0].sender_handle.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn recent_returns_last_k_in_ascending_order() {
        let log = InMemoryMessageLog::new();
        for i in 0..7 {
            log.append("c", Role::User, &format!("m{i}"), None).await.unwrap();
            log.append("other", Role::User, "noise", None).await.unwrap();
        }

        for k in [0usize, 1, 3, 7, 20] {
            let recent = log.recent("c", k).await.unwrap();
            assert_eq!(recent.len(), k.min(7));
            let expected: Vec<String> = (7 - k.min(7)..7).map(|i| format!("m{i}")).collect();
            let actual: Vec<String> = recent.iter().map(|m| m.content.clone()).collect();
            assert_eq!(actual, expected);
            assert!(recent.windows(2).all(|w| w[0].id < w[1].id));
        }
    }

    #[tokio::test]
    async fn by_ids_sorted_and_skips_unknown() {
        let log = InMemoryMessageLog::new();
        let a = log.append("c", Role::User, "a", None).await.unwrap();
        let b = log.append("c", Role::Assistant, "b", None).await.unwrap();

        let found = log.by_ids(&[b.id, 999, a.id]).await.unwrap();
        let ids: Vec<i64> = found.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![a.id, b.id]);
    }

    #[tokio::test]
    async fn delete_conversation_only_touches_target() {
        let log = InMemoryMessageLog::new();
        log.append("a", Role::User, "1", None).await.unwrap();
        log.append("a", Role::User, "2", None).await.unwrap();
        log.append("b", Role::User, "3", None).await.unwrap();

        assert_eq!(log.delete_conversation("a").await.unwrap(), 2);
        assert_eq!(log.count("a").await.unwrap(), 0);
        assert_eq!(log.count("b").await.unwrap(), 1);
    }
}

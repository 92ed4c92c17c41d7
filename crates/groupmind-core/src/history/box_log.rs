//! BoxMessageLog -- object-safe dynamic dispatch wrapper for MessageLog.
//!
//! Same blanket-impl pattern as BoxEmbedder and BoxLlmProvider:
//! 1. Define an object-safe `MessageLogDyn` trait with boxed futures
//! 2. Blanket-impl `MessageLogDyn` for all `T: MessageLog`
//! 3. `BoxMessageLog` wraps `Box<dyn MessageLogDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use groupmind_types::error::RepositoryError;
use groupmind_types::message::{Message, Role};

use super::log::MessageLog;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, RepositoryError>> + Send + 'a>>;

/// Object-safe version of [`MessageLog`] with boxed futures.
pub trait MessageLogDyn: Send + Sync {
    fn append_boxed<'a>(
        &'a self,
        conversation_id: &'a str,
        role: Role,
        content: &'a str,
        sender_handle: Option<&'a str>,
    ) -> BoxFuture<'a, Message>;

    fn recent_boxed<'a>(&'a self, conversation_id: &'a str, limit: usize) -> BoxFuture<'a, Vec<Message>>;

    fn by_ids_boxed<'a>(&'a self, ids: &'a [i64]) -> BoxFuture<'a, Vec<Message>>;

    fn count_boxed<'a>(&'a self, conversation_id: &'a str) -> BoxFuture<'a, u64>;

    fn delete_conversation_boxed<'a>(&'a self, conversation_id: &'a str) -> BoxFuture<'a, u64>;
}

impl<T: MessageLog> MessageLogDyn for T {
    fn append_boxed<'a>(
        &'a self,
        conversation_id: &'a str,
        role: Role,
        content: &'a str,
        sender_handle: Option<&'a str>,
    ) -> BoxFuture<'a, Message> {
        Box::pin(self.append(conversation_id, role, content, sender_handle))
    }

    fn recent_boxed<'a>(&'a self, conversation_id: &'a str, limit: usize) -> BoxFuture<'a, Vec<Message>> {
        Box::pin(self.recent(conversation_id, limit))
    }

    fn by_ids_boxed<'a>(&'a self, ids: &'a [i64]) -> BoxFuture<'a, Vec<Message>> {
        Box::pin(self.by_ids(ids))
    }

    fn count_boxed<'a>(&'a self, conversation_id: &'a str) -> BoxFuture<'a, u64> {
        Box::pin(self.count(conversation_id))
    }

    fn delete_conversation_boxed<'a>(&'a self, conversation_id: &'a str) -> BoxFuture<'a, u64> {
        Box::pin(self.delete_conversation(conversation_id))
    }
}

/// Type-erased message log, so the CLI can pick SQLite or in-memory storage
/// at runtime.
pub struct BoxMessageLog {
    inner: Box<dyn MessageLogDyn + Send + Sync>,
}

impl BoxMessageLog {
    pub fn new<T: MessageLog + 'static>(log: T) -> Self {
        Self {
            inner: Box::new(log),
        }
    }

    pub async fn append(
        &self,
        conversation_id: &str,
        role: Role,
        content: &str,
        sender_handle: Option<&str>,
    ) -> Result<Message, RepositoryError> {
        self.inner
            .append_boxed(conversation_id, role, content, sender_handle)
            .await
    }

    pub async fn recent(&self, conversation_id: &str, limit: usize) -> Result<Vec<Message>, RepositoryError> {
        self.inner.recent_boxed(conversation_id, limit).await
    }

    pub async fn by_ids(&self, ids: &[i64]) -> Result<Vec<Message>, RepositoryError> {
        self.inner.by_ids_boxed(ids).await
    }

    pub async fn count(&self, conversation_id: &str) -> Result<u64, RepositoryError> {
        self.inner.count_boxed(conversation_id).await
    }

    pub async fn delete_conversation(&self, conversation_id: &str) -> Result<u64, RepositoryError> {
        self.inner.delete_conversation_boxed(conversation_id).await
    }
}

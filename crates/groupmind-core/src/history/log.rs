//! MessageLog trait definition.
//!
//! Append-only per-conversation message storage with chronological read-back.
//! Follows the same RPITIT pattern as the other collaborator traits.

use groupmind_types::error::RepositoryError;
use groupmind_types::message::{Message, Role};

/// Repository trait for conversation turns.
///
/// Implementations live in groupmind-infra (e.g., `SqliteMessageLog`), plus
/// [`InMemoryMessageLog`](super::in_memory::InMemoryMessageLog) for ephemeral use.
/// Every `append` creates a new row; there is no dedup and no update path.
pub trait MessageLog: Send + Sync {
    /// Persist a new turn and return it with its assigned id and timestamp.
    fn append(
        &self,
        conversation_id: &str,
        role: Role,
        content: &str,
        sender_handle: Option<&str>,
    ) -> impl std::future::Future<Output = Result<Message, RepositoryError>> + Send;

    /// The most recent `limit` messages of a conversation, oldest first.
    fn recent(
        &self,
        conversation_id: &str,
        limit: usize,
    ) -> impl std::future::Future<Output = Result<Vec<Message>, RepositoryError>> + Send;

    /// Messages with the given ids, oldest first. Unknown ids are skipped.
    fn by_ids(
        &self,
        ids: &[i64],
    ) -> impl std::future::Future<Output = Result<Vec<Message>, RepositoryError>> + Send;

    /// Number of messages stored for a conversation.
    fn count(
        &self,
        conversation_id: &str,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;

    /// Remove every message of a conversation. Returns the deleted count.
    ///
    /// Maintenance only; the reply engine never calls this.
    fn delete_conversation(
        &self,
        conversation_id: &str,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}

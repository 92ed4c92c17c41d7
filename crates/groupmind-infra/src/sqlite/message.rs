//! SQLite message log implementation.
//!
//! Implements `MessageLog` from `groupmind-core` using sqlx with split
//! read/write pools. Rows are append-only; `id` is an AUTOINCREMENT key, so
//! id order is insertion order.

use chrono::{DateTime, Utc};
use groupmind_core::history::log::MessageLog;
use groupmind_types::error::RepositoryError;
use groupmind_types::message::{Message, Role};
use sqlx::Row;

use super::pool::DatabasePool;

/// Stay well under SQLite's bound-parameter limit for `IN (...)` lookups.
const MAX_IDS_PER_QUERY: usize = 500;

/// SQLite-backed implementation of `MessageLog`.
pub struct SqliteMessageLog {
    pool: DatabasePool,
}

impl SqliteMessageLog {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Internal row types
// ---------------------------------------------------------------------------

struct MessageRow {
    id: i64,
    conversation_id: String,
    role: String,
    content: String,
    sender_handle: Option<String>,
    created_at: String,
}

impl MessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            conversation_id: row.try_get("conversation_id")?,
            role: row.try_get("role")?,
            content: row.try_get("content")?,
            sender_handle: row.try_get("sender_handle")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_message(self) -> Result<Message, RepositoryError> {
        let role: Role = self
            .role
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;

        Ok(Message {
            id: self.id,
            conversation_id: self.conversation_id,
            role,
            content: self.content,
            sender_handle: self.sender_handle,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn rows_to_messages(rows: &[sqlx::sqlite::SqliteRow]) -> Result<Vec<Message>, RepositoryError> {
    rows.iter()
        .map(|row| {
            MessageRow::from_row(row)
                .map_err(|e| RepositoryError::Query(e.to_string()))?
                .into_message()
        })
        .collect()
}

// ---------------------------------------------------------------------------
// MessageLog impl
// ---------------------------------------------------------------------------

impl MessageLog for SqliteMessageLog {
    async fn append(
        &self,
        conversation_id: &str,
        role: Role,
        content: &str,
        sender_handle: Option<&str>,
    ) -> Result<Message, RepositoryError> {
        let mut tx = self
            .pool
            .writer
            .begin()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        // created_at never goes backwards within a conversation, even if the
        // wall clock does.
        let last: Option<(String,)> = sqlx::query_as(
            "SELECT created_at FROM messages WHERE conversation_id = ? ORDER BY id DESC LIMIT 1",
        )
        .bind(conversation_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let now = Utc::now();
        let created_at = match last {
            Some((ts,)) => parse_datetime(&ts)?.max(now),
            None => now,
        };

        let row = sqlx::query(
            r#"INSERT INTO messages (conversation_id, role, content, sender_handle, created_at)
               VALUES (?, ?, ?, ?, ?)
               RETURNING id"#,
        )
        .bind(conversation_id)
        .bind(role.to_string())
        .bind(content)
        .bind(sender_handle)
        .bind(format_datetime(&created_at))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let id: i64 = row
            .try_get("id")
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(Message {
            id,
            conversation_id: conversation_id.to_string(),
            role,
            content: content.to_string(),
            sender_handle: sender_handle.map(str::to_string),
            created_at,
        })
    }

    async fn recent(&self, conversation_id: &str, limit: usize) -> Result<Vec<Message>, RepositoryError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            r#"SELECT * FROM (
                   SELECT id, conversation_id, role, content, sender_handle, created_at
                   FROM messages
                   WHERE conversation_id = ?
                   ORDER BY id DESC
                   LIMIT ?
               ) ORDER BY id ASC"#,
        )
        .bind(conversation_id)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows_to_messages(&rows)
    }

    async fn by_ids(&self, ids: &[i64]) -> Result<Vec<Message>, RepositoryError> {
        let mut messages = Vec::with_capacity(ids.len());

        for batch in ids.chunks(MAX_IDS_PER_QUERY) {
            let placeholders = vec!["?"; batch.len()].join(", ");
            let sql = format!(
                "SELECT id, conversation_id, role, content, sender_handle, created_at \
                 FROM messages WHERE id IN ({placeholders})"
            );
            let mut query = sqlx::query(&sql);
            for id in batch {
                query = query.bind(*id);
            }
            let rows = query
                .fetch_all(&self.pool.reader)
                .await
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            messages.extend(rows_to_messages(&rows)?);
        }

        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        messages.dedup_by_key(|m| m.id);
        Ok(messages)
    }

    async fn count(&self, conversation_id: &str) -> Result<u64, RepositoryError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM messages WHERE conversation_id = ?")
                .bind(conversation_id)
                .fetch_one(&self.pool.reader)
                .await
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
        Ok(count.max(0) as u64)
    }

    async fn delete_conversation(&self, conversation_id: &str) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM messages WHERE conversation_id = ?")
            .bind(conversation_id)
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        Ok(result.rows_affected())
    }
}

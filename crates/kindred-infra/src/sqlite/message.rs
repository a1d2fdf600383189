//! SQLite message repository implementation.
//!
//! Implements `MessageRepository` from `kindred-core` using sqlx with split
//! read/write pools: raw queries, a private Row struct for mapping, writes on
//! the writer pool and reads on the reader pool.

use chrono::{DateTime, Utc};
use sqlx::Row;

use kindred_core::repository::message::MessageRepository;
use kindred_types::error::RepositoryError;
use kindred_types::message::{Message, NewMessage, SortOrder};

use super::pool::DatabasePool;

/// SQLite-backed implementation of `MessageRepository`.
pub struct SqliteMessageRepository {
    pool: DatabasePool,
}

impl SqliteMessageRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Internal row type for mapping SQLite rows to domain Message.
struct MessageRow {
    id: i64,
    sender_id: i64,
    receiver_id: i64,
    content: String,
    is_ai: i64,
    created_at: String,
    session_id: Option<String>,
}

impl MessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            sender_id: row.try_get("sender_id")?,
            receiver_id: row.try_get("receiver_id")?,
            content: row.try_get("content")?,
            is_ai: row.try_get("is_ai")?,
            created_at: row.try_get("created_at")?,
            session_id: row.try_get("session_id")?,
        })
    }

    fn into_message(self) -> Result<Message, RepositoryError> {
        Ok(Message {
            id: self.id,
            sender_id: self.sender_id,
            receiver_id: self.receiver_id,
            content: self.content,
            is_ai: self.is_ai != 0,
            created_at: parse_datetime(&self.created_at)?,
            session_id: self.session_id,
        })
    }
}

pub(crate) fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

/// Map a sqlx error, surfacing constraint violations as `Conflict`.
pub(crate) fn map_sqlx_err(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e {
        let message = db_err.message();
        if message.contains("FOREIGN KEY constraint failed")
            || message.contains("UNIQUE constraint failed")
        {
            return RepositoryError::Conflict(message.to_string());
        }
    }
    RepositoryError::Query(e.to_string())
}

impl MessageRepository for SqliteMessageRepository {
    async fn append(&self, message: &NewMessage) -> Result<Message, RepositoryError> {
        let created_at = Utc::now();
        let result = sqlx::query(
            r#"INSERT INTO messages (sender_id, receiver_id, content, is_ai, created_at, session_id)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(message.sender_id)
        .bind(message.receiver_id)
        .bind(&message.content)
        .bind(message.is_ai as i64)
        .bind(format_datetime(&created_at))
        .bind(&message.session_id)
        .execute(&self.pool.writer)
        .await
        .map_err(map_sqlx_err)?;

        Ok(Message {
            id: result.last_insert_rowid(),
            sender_id: message.sender_id,
            receiver_id: message.receiver_id,
            content: message.content.clone(),
            is_ai: message.is_ai,
            created_at,
            session_id: message.session_id.clone(),
        })
    }

    async fn list_between(
        &self,
        user_a: i64,
        user_b: i64,
        session_id: Option<&str>,
        order: SortOrder,
        limit: Option<i64>,
    ) -> Result<Vec<Message>, RepositoryError> {
        let mut sql = String::from(
            r#"SELECT * FROM messages
               WHERE ((sender_id = ? AND receiver_id = ?) OR (sender_id = ? AND receiver_id = ?))"#,
        );
        if session_id.is_some() {
            sql.push_str(" AND session_id = ?");
        }
        match order {
            SortOrder::Asc => sql.push_str(" ORDER BY created_at ASC, id ASC"),
            SortOrder::Desc => sql.push_str(" ORDER BY created_at DESC, id DESC"),
        }
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        let mut query = sqlx::query(&sql)
            .bind(user_a)
            .bind(user_b)
            .bind(user_b)
            .bind(user_a);
        if let Some(sid) = session_id {
            query = query.bind(sid);
        }

        let rows = query
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut messages = Vec::with_capacity(rows.len());
        for row in &rows {
            let msg_row =
                MessageRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            messages.push(msg_row.into_message()?);
        }

        Ok(messages)
    }

    async fn delete_session(
        &self,
        user_a: i64,
        user_b: i64,
        session_id: &str,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r#"DELETE FROM messages
               WHERE ((sender_id = ? AND receiver_id = ?) OR (sender_id = ? AND receiver_id = ?))
                 AND session_id = ?"#,
        )
        .bind(user_a)
        .bind(user_b)
        .bind(user_b)
        .bind(user_a)
        .bind(session_id)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(result.rows_affected())
    }

    async fn count_for_session(&self, session_id: &str) -> Result<u64, RepositoryError> {
        let row = sqlx::query("SELECT COUNT(*) as cnt FROM messages WHERE session_id = ?")
            .bind(session_id)
            .fetch_one(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let count: i64 = row
            .try_get("cnt")
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(count as u64)
    }
}

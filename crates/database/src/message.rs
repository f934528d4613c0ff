//! Conversation message persistence.

use sqlx::SqlitePool;

use crate::models::{Message, MessageDirection};
use crate::Result;

/// Append a message to a conversation. Returns the new message ID.
pub async fn insert_message(
    pool: &SqlitePool,
    conversation_id: &str,
    direction: MessageDirection,
    content: &str,
    sender_name: Option<&str>,
) -> Result<i64> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO messages (conversation_id, direction, content, sender_name)
        VALUES (?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(conversation_id)
    .bind(direction.as_str())
    .bind(content)
    .bind(sender_name)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Get the most recent messages of a conversation, oldest first.
pub async fn list_recent_messages(
    pool: &SqlitePool,
    conversation_id: &str,
    limit: i64,
) -> Result<Vec<Message>> {
    let mut rows = sqlx::query_as::<_, Message>(
        r#"
        SELECT id, conversation_id, direction, content, sender_name, created_at
        FROM messages
        WHERE conversation_id = ?
        ORDER BY id DESC
        LIMIT ?
        "#,
    )
    .bind(conversation_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.reverse();
    Ok(rows)
}

/// Count messages in a conversation.
pub async fn count_messages(pool: &SqlitePool, conversation_id: &str) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM messages
        WHERE conversation_id = ?
        "#,
    )
    .bind(conversation_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

//! Contact and conversation persistence.

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{DatabaseError, Result};
use crate::models::{Contact, Conversation, ConversationStatus};

const CONVERSATION_COLUMNS: &str = "id, company_id, channel_id, contact_id, status, \
     assigned_agent_id, flow_node_id, last_message_at, last_inbound_at, created_at";

/// Find a contact by platform identifier, creating it on first sight.
///
/// A known contact keeps its ID; a newly supplied name replaces the stored one.
pub async fn upsert_contact(
    pool: &SqlitePool,
    company_id: &str,
    external_id: &str,
    name: Option<&str>,
) -> Result<Contact> {
    sqlx::query(
        r#"
        INSERT INTO contacts (id, company_id, external_id, name)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(company_id, external_id) DO UPDATE SET
            name = COALESCE(excluded.name, contacts.name)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(company_id)
    .bind(external_id)
    .bind(name)
    .execute(pool)
    .await?;

    sqlx::query_as::<_, Contact>(
        r#"
        SELECT id, company_id, external_id, name, created_at
        FROM contacts
        WHERE company_id = ? AND external_id = ?
        "#,
    )
    .bind(company_id)
    .bind(external_id)
    .fetch_one(pool)
    .await
    .map_err(DatabaseError::from)
}

/// Get a contact by ID.
pub async fn get_contact(pool: &SqlitePool, id: &str) -> Result<Contact> {
    sqlx::query_as::<_, Contact>(
        r#"
        SELECT id, company_id, external_id, name, created_at
        FROM contacts
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Contact",
        id: id.to_string(),
    })
}

/// Get a conversation by ID.
pub async fn get_conversation(pool: &SqlitePool, id: &str) -> Result<Conversation> {
    let query = format!("SELECT {CONVERSATION_COLUMNS} FROM conversations WHERE id = ?");
    sqlx::query_as::<_, Conversation>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound {
            entity: "Conversation",
            id: id.to_string(),
        })
}

/// Find the live (not closed) conversation for a channel and contact, or open a new one.
///
/// Returns the conversation and whether it was just created.
pub async fn find_or_create_conversation(
    pool: &SqlitePool,
    company_id: &str,
    channel_id: &str,
    contact_id: &str,
) -> Result<(Conversation, bool)> {
    let query = format!(
        "SELECT {CONVERSATION_COLUMNS} FROM conversations \
         WHERE channel_id = ? AND contact_id = ? AND status != ? \
         ORDER BY created_at DESC LIMIT 1"
    );
    let existing = sqlx::query_as::<_, Conversation>(&query)
        .bind(channel_id)
        .bind(contact_id)
        .bind(ConversationStatus::Closed.as_str())
        .fetch_optional(pool)
        .await?;

    if let Some(conversation) = existing {
        return Ok((conversation, false));
    }

    let id = Uuid::new_v4().to_string();
    sqlx::query(
        r#"
        INSERT INTO conversations (id, company_id, channel_id, contact_id, status)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(company_id)
    .bind(channel_id)
    .bind(contact_id)
    .bind(ConversationStatus::Open.as_str())
    .execute(pool)
    .await?;

    tracing::debug!(conversation_id = %id, channel_id, "Opened conversation");

    Ok((get_conversation(pool, &id).await?, true))
}

/// Record that an inbound message just arrived.
pub async fn touch_inbound(pool: &SqlitePool, id: &str) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE conversations
        SET last_message_at = datetime('now'), last_inbound_at = datetime('now')
        WHERE id = ?
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Record that an outbound message was just sent.
pub async fn touch_outbound(pool: &SqlitePool, id: &str) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE conversations
        SET last_message_at = datetime('now')
        WHERE id = ?
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Store the conversation's chatbot flow position (`None` leaves the flow).
pub async fn set_flow_node(pool: &SqlitePool, id: &str, node_id: Option<&str>) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE conversations
        SET flow_node_id = ?
        WHERE id = ?
        "#,
    )
    .bind(node_id)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Change the conversation status.
pub async fn set_status(pool: &SqlitePool, id: &str, status: ConversationStatus) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE conversations
        SET status = ?
        WHERE id = ?
        "#,
    )
    .bind(status.as_str())
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Conversation",
            id: id.to_string(),
        });
    }

    Ok(())
}

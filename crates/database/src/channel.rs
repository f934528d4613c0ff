//! Channel persistence.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{AutomationPriority, Channel, ChannelType};

/// Create a channel for a company.
pub async fn create_channel(
    pool: &SqlitePool,
    id: &str,
    company_id: &str,
    channel_type: ChannelType,
    config: &serde_json::Value,
    priority: AutomationPriority,
) -> Result<Channel> {
    sqlx::query(
        r#"
        INSERT INTO channels (id, company_id, channel_type, config_json, automation_priority)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(company_id)
    .bind(channel_type.as_str())
    .bind(config.to_string())
    .bind(priority.as_str())
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "Channel",
                    id: id.to_string(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    get_channel(pool, id).await
}

/// Get a channel by ID.
pub async fn get_channel(pool: &SqlitePool, id: &str) -> Result<Channel> {
    sqlx::query_as::<_, Channel>(
        r#"
        SELECT id, company_id, channel_type, status, config_json, automation_priority, created_at
        FROM channels
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Channel",
        id: id.to_string(),
    })
}

/// Change which automation stage runs first on a channel.
pub async fn set_automation_priority(
    pool: &SqlitePool,
    id: &str,
    priority: AutomationPriority,
) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE channels
        SET automation_priority = ?
        WHERE id = ?
        "#,
    )
    .bind(priority.as_str())
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Channel",
            id: id.to_string(),
        });
    }

    Ok(())
}

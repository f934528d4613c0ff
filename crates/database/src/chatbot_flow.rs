//! Chatbot flow definition persistence.

use sqlx::SqlitePool;

use crate::models::ChatbotFlowRecord;
use crate::Result;

/// Create or replace a flow definition.
pub async fn upsert_flow(
    pool: &SqlitePool,
    id: &str,
    company_id: &str,
    channel_id: Option<&str>,
    name: &str,
    flow_json: &str,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO chatbot_flows (id, company_id, channel_id, name, flow_json)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            channel_id = excluded.channel_id,
            name = excluded.name,
            flow_json = excluded.flow_json,
            updated_at = datetime('now')
        "#,
    )
    .bind(id)
    .bind(company_id)
    .bind(channel_id)
    .bind(name)
    .bind(flow_json)
    .execute(pool)
    .await?;

    Ok(())
}

/// Get the live flow for a channel.
///
/// A flow bound to the channel wins over a company-wide flow.
pub async fn active_flow_for_channel(
    pool: &SqlitePool,
    company_id: &str,
    channel_id: &str,
) -> Result<Option<ChatbotFlowRecord>> {
    let record = sqlx::query_as::<_, ChatbotFlowRecord>(
        r#"
        SELECT id, company_id, channel_id, name, flow_json, active, updated_at
        FROM chatbot_flows
        WHERE company_id = ? AND active = 1 AND (channel_id = ? OR channel_id IS NULL)
        ORDER BY channel_id IS NULL, updated_at DESC
        LIMIT 1
        "#,
    )
    .bind(company_id)
    .bind(channel_id)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

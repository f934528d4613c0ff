//! Conversation insight persistence.
//!
//! A conversation keeps a single live insight: each analysis overwrites it.

use sqlx::SqlitePool;

use crate::models::ConversationInsight;
use crate::Result;

/// Insight values produced by one analysis run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsightValues<'a> {
    pub company_id: &'a str,
    pub conversation_id: &'a str,
    pub tone_score: i64,
    pub clarity_score: i64,
    pub summary: &'a str,
    pub flags_json: &'a str,
}

/// Update the conversation's insight in place, or create it.
///
/// One statement against the `UNIQUE(conversation_id)` constraint, so concurrent analyses
/// of the same conversation still leave a single row.
pub async fn upsert_insight(
    pool: &SqlitePool,
    values: &InsightValues<'_>,
) -> Result<ConversationInsight> {
    let record = sqlx::query_as::<_, ConversationInsight>(
        r#"
        INSERT INTO conversation_insights
            (company_id, conversation_id, tone_score, clarity_score, summary, flags_json)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(conversation_id) DO UPDATE SET
            tone_score = excluded.tone_score,
            clarity_score = excluded.clarity_score,
            summary = excluded.summary,
            flags_json = excluded.flags_json,
            updated_at = datetime('now')
        RETURNING id, company_id, conversation_id, tone_score, clarity_score,
                  summary, flags_json, created_at, updated_at
        "#,
    )
    .bind(values.company_id)
    .bind(values.conversation_id)
    .bind(values.tone_score)
    .bind(values.clarity_score)
    .bind(values.summary)
    .bind(values.flags_json)
    .fetch_one(pool)
    .await?;

    Ok(record)
}

/// Get the most recent insight for a conversation.
pub async fn latest_insight(
    pool: &SqlitePool,
    conversation_id: &str,
) -> Result<Option<ConversationInsight>> {
    let record = sqlx::query_as::<_, ConversationInsight>(
        r#"
        SELECT id, company_id, conversation_id, tone_score, clarity_score,
               summary, flags_json, created_at, updated_at
        FROM conversation_insights
        WHERE conversation_id = ?
        ORDER BY id DESC
        LIMIT 1
        "#,
    )
    .bind(conversation_id)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

/// Count insights stored for a conversation.
pub async fn count_insights(pool: &SqlitePool, conversation_id: &str) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM conversation_insights
        WHERE conversation_id = ?
        "#,
    )
    .bind(conversation_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

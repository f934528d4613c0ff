//! Ledger persistence: balance mutations, credit transactions and usage logs.
//!
//! Every balance change is a single `UPDATE ... RETURNING credit_balance` executed in the
//! same transaction as the ledger row that records it, so `balance_after` always equals the
//! value the update produced, even when several conversations of one company are billed
//! concurrently.

use sqlx::{Sqlite, SqliteExecutor, SqlitePool, Transaction};

use crate::error::{DatabaseError, Result};
use crate::models::{AiUsageLog, CreditTransaction, TransactionKind};

const TRANSACTION_COLUMNS: &str =
    "id, company_id, kind, amount, balance_after, description, reference_id, created_at";

/// Token consumption to be recorded in the usage log.
#[derive(Debug, Clone, Copy)]
pub struct NewUsageLog<'a> {
    pub company_id: &'a str,
    pub conversation_id: Option<&'a str>,
    pub model: &'a str,
    pub prompt_tokens: i64,
    pub completion_tokens: i64,
    pub total_tokens: i64,
}

/// Result of an idempotent credit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreditOutcome {
    /// The balance changed and this transaction was recorded.
    Applied(CreditTransaction),
    /// A transaction with the same reference already exists; nothing changed.
    Duplicate { balance: i64 },
}

impl CreditOutcome {
    /// Balance after the call, whether or not it applied.
    pub fn balance(&self) -> i64 {
        match self {
            CreditOutcome::Applied(tx) => tx.balance_after,
            CreditOutcome::Duplicate { balance } => *balance,
        }
    }
}

/// Charge `cost` credits for AI usage.
///
/// Decrements the balance, records an `AI_USAGE` transaction and the usage log in one
/// commit. The balance may go negative; it is never corrected afterwards.
pub async fn charge_usage(
    pool: &SqlitePool,
    usage: &NewUsageLog<'_>,
    cost: i64,
    description: &str,
) -> Result<CreditTransaction> {
    let mut tx = pool.begin().await?;

    let balance = adjust_balance(&mut tx, usage.company_id, -cost).await?;
    let record = insert_transaction(
        &mut tx,
        usage.company_id,
        TransactionKind::AiUsage,
        -cost,
        balance,
        description,
        None,
    )
    .await?;
    write_usage_log(&mut *tx, usage, cost, false).await?;

    tx.commit().await?;
    Ok(record)
}

/// Add `amount` credits (may be negative for adjustments).
///
/// When `reference_id` is already recorded the call is a no-op returning the current
/// balance. The unique constraint on `reference_id` closes the race between two
/// concurrent deliveries that both pass the existence check.
pub async fn apply_credit(
    pool: &SqlitePool,
    company_id: &str,
    amount: i64,
    kind: TransactionKind,
    description: &str,
    reference_id: Option<&str>,
) -> Result<CreditOutcome> {
    if let Some(reference) = reference_id {
        if find_by_reference(pool, reference).await?.is_some() {
            tracing::info!(reference_id = reference, "Credit already applied, skipping");
            let balance = crate::company::get_balance(pool, company_id).await?;
            return Ok(CreditOutcome::Duplicate { balance });
        }
    }

    let mut tx = pool.begin().await?;

    let balance = adjust_balance(&mut tx, company_id, amount).await?;
    let inserted = insert_transaction(
        &mut tx,
        company_id,
        kind,
        amount,
        balance,
        description,
        reference_id,
    )
    .await;

    match inserted {
        Ok(record) => {
            tx.commit().await?;
            Ok(CreditOutcome::Applied(record))
        }
        Err(err) if reference_id.is_some() && err.is_unique_violation() => {
            tx.rollback().await?;
            tracing::info!(
                reference_id = reference_id.unwrap_or_default(),
                "Concurrent duplicate credit rejected by unique constraint"
            );
            let balance = crate::company::get_balance(pool, company_id).await?;
            Ok(CreditOutcome::Duplicate { balance })
        }
        Err(err) => Err(err),
    }
}

/// Record usage paid with the company's own key (no balance change).
pub async fn insert_usage_log(
    pool: &SqlitePool,
    usage: &NewUsageLog<'_>,
    cost: i64,
    used_own_key: bool,
) -> Result<()> {
    write_usage_log(pool, usage, cost, used_own_key).await
}

/// Find the transaction carrying an external reference.
pub async fn find_by_reference(
    pool: &SqlitePool,
    reference_id: &str,
) -> Result<Option<CreditTransaction>> {
    let query = format!("SELECT {TRANSACTION_COLUMNS} FROM credit_transactions WHERE reference_id = ?");
    let record = sqlx::query_as::<_, CreditTransaction>(&query)
        .bind(reference_id)
        .fetch_optional(pool)
        .await?;

    Ok(record)
}

/// List a company's transactions, newest first.
pub async fn list_transactions(
    pool: &SqlitePool,
    company_id: &str,
    limit: i64,
) -> Result<Vec<CreditTransaction>> {
    let query = format!(
        "SELECT {TRANSACTION_COLUMNS} FROM credit_transactions \
         WHERE company_id = ? ORDER BY id DESC LIMIT ?"
    );
    let rows = sqlx::query_as::<_, CreditTransaction>(&query)
        .bind(company_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// List a company's usage logs, newest first.
pub async fn list_usage_logs(
    pool: &SqlitePool,
    company_id: &str,
    limit: i64,
) -> Result<Vec<AiUsageLog>> {
    let rows = sqlx::query_as::<_, AiUsageLog>(
        r#"
        SELECT id, company_id, conversation_id, model, prompt_tokens, completion_tokens,
               total_tokens, cost_cop, used_own_key, created_at
        FROM ai_usage_logs
        WHERE company_id = ?
        ORDER BY id DESC
        LIMIT ?
        "#,
    )
    .bind(company_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

async fn adjust_balance(
    tx: &mut Transaction<'_, Sqlite>,
    company_id: &str,
    delta: i64,
) -> Result<i64> {
    sqlx::query_scalar::<_, i64>(
        r#"
        UPDATE companies
        SET credit_balance = credit_balance + ?, updated_at = datetime('now')
        WHERE id = ?
        RETURNING credit_balance
        "#,
    )
    .bind(delta)
    .bind(company_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Company",
        id: company_id.to_string(),
    })
}

async fn insert_transaction(
    tx: &mut Transaction<'_, Sqlite>,
    company_id: &str,
    kind: TransactionKind,
    amount: i64,
    balance_after: i64,
    description: &str,
    reference_id: Option<&str>,
) -> Result<CreditTransaction> {
    let query = format!(
        "INSERT INTO credit_transactions \
             (company_id, kind, amount, balance_after, description, reference_id) \
         VALUES (?, ?, ?, ?, ?, ?) \
         RETURNING {TRANSACTION_COLUMNS}"
    );
    let record = sqlx::query_as::<_, CreditTransaction>(&query)
        .bind(company_id)
        .bind(kind.as_str())
        .bind(amount)
        .bind(balance_after)
        .bind(description)
        .bind(reference_id)
        .fetch_one(&mut **tx)
        .await?;

    Ok(record)
}

async fn write_usage_log<'e, E>(
    executor: E,
    usage: &NewUsageLog<'_>,
    cost: i64,
    used_own_key: bool,
) -> Result<()>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO ai_usage_logs
            (company_id, conversation_id, model, prompt_tokens, completion_tokens,
             total_tokens, cost_cop, used_own_key)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(usage.company_id)
    .bind(usage.conversation_id)
    .bind(usage.model)
    .bind(usage.prompt_tokens)
    .bind(usage.completion_tokens)
    .bind(usage.total_tokens)
    .bind(cost)
    .bind(used_own_key)
    .execute(executor)
    .await?;

    Ok(())
}

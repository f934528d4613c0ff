//! Company persistence.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::Company;

/// Create a company with an opening balance.
pub async fn create_company(
    pool: &SqlitePool,
    id: &str,
    name: &str,
    credit_balance: i64,
) -> Result<Company> {
    sqlx::query(
        r#"
        INSERT INTO companies (id, name, credit_balance)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(credit_balance)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "Company",
                    id: id.to_string(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    get_company(pool, id).await
}

/// Get a company by ID.
pub async fn get_company(pool: &SqlitePool, id: &str) -> Result<Company> {
    find_company(pool, id).await?.ok_or_else(|| DatabaseError::NotFound {
        entity: "Company",
        id: id.to_string(),
    })
}

/// Get a company by ID, if it exists.
pub async fn find_company(pool: &SqlitePool, id: &str) -> Result<Option<Company>> {
    let record = sqlx::query_as::<_, Company>(
        r#"
        SELECT id, name, credit_balance, openai_api_key, created_at, updated_at
        FROM companies
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

/// Get the current credit balance of a company.
pub async fn get_balance(pool: &SqlitePool, id: &str) -> Result<i64> {
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT credit_balance
        FROM companies
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Company",
        id: id.to_string(),
    })
}

/// Store (or clear) the company's encrypted provider key.
pub async fn set_openai_api_key(
    pool: &SqlitePool,
    id: &str,
    encrypted_key: Option<&str>,
) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE companies
        SET openai_api_key = ?, updated_at = datetime('now')
        WHERE id = ?
        "#,
    )
    .bind(encrypted_key)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Company",
            id: id.to_string(),
        });
    }

    Ok(())
}

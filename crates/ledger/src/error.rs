//! Error types for ledger operations.

use database::DatabaseError;
use thiserror::Error;

/// Errors that can occur while reading or mutating a company's credits.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Persistence failed; the operation did not apply.
    #[error("ledger storage error: {0}")]
    Database(DatabaseError),

    /// The company does not exist.
    #[error("company not found: {0}")]
    CompanyNotFound(String),

    /// The amount is not valid for the transaction kind.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
}

impl From<DatabaseError> for LedgerError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound {
                entity: "Company",
                id,
            } => LedgerError::CompanyNotFound(id),
            other => LedgerError::Database(other),
        }
    }
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

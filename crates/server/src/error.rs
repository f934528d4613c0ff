//! Error types for the HTTP API.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use database::DatabaseError;
use ledger::LedgerError;
use thiserror::Error;

/// Errors returned by the JSON API.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Ledger error.
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Unknown resource.
    #[error("{0} not found")]
    NotFound(String),

    /// Malformed request.
    #[error("{0}")]
    BadRequest(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServerError::Database(DatabaseError::NotFound { .. })
            | ServerError::Ledger(LedgerError::CompanyNotFound(_))
            | ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Ledger(LedgerError::InvalidAmount(_)) | ServerError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ServerError::Database(err) => {
                tracing::error!("Database error: {}", err);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ServerError::Ledger(err) => {
                tracing::error!("Ledger error: {}", err);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = serde_json::json!({
            "error": self.to_string()
        });

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type Result<T> = std::result::Result<T, ServerError>;

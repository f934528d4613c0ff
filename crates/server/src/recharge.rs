//! Payment gateway events that top up a company's credits.
//!
//! An event is accepted only when its checksum verifies against the shared secret. The
//! gateway's transaction id becomes the ledger reference, so redelivered events are no-ops.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use database::{company, Database, DatabaseError, TransactionKind};
use ledger::{Ledger, LedgerError};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::RechargeConfig;

/// The only event type that can move money.
pub const TRANSACTION_UPDATED: &str = "transaction.updated";

/// Terminal status of a paid transaction.
pub const APPROVED: &str = "APPROVED";

/// Webhook body as posted by the gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RechargeEvent {
    pub event: String,
    #[serde(default)]
    pub data: Option<EventData>,
    #[serde(default)]
    pub signature: Option<EventSignature>,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EventData {
    #[serde(default)]
    pub transaction: Option<GatewayTransaction>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewayTransaction {
    pub id: String,
    pub status: String,
    pub amount_in_cents: i64,
    pub reference: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EventSignature {
    pub checksum: String,
    #[serde(default)]
    pub properties: Vec<String>,
}

/// How an event was settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RechargeOutcome {
    /// Nothing to do for this event.
    Ignored { reason: &'static str },
    /// Credits were added, or had already been added for this transaction.
    Credited {
        company_id: String,
        new_balance: i64,
        applied: bool,
    },
}

impl IntoResponse for RechargeOutcome {
    fn into_response(self) -> Response {
        let body = match self {
            RechargeOutcome::Ignored { .. } => serde_json::json!({ "status": "ignored" }),
            RechargeOutcome::Credited { new_balance, .. } => serde_json::json!({
                "status": "success",
                "newBalance": new_balance,
            }),
        };

        (StatusCode::OK, Json(body)).into_response()
    }
}

/// Reasons an event is rejected.
#[derive(Debug, Error)]
pub enum RechargeError {
    #[error("recharge events secret is not configured")]
    MissingSecret,

    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid payload: {0}")]
    InvalidPayload(&'static str),

    #[error("invalid reference: {0}")]
    InvalidReference(String),

    #[error("company not found: {0}")]
    CompanyNotFound(String),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("database error: {0}")]
    Database(#[from] DatabaseError),
}

impl RechargeError {
    pub fn status(&self) -> StatusCode {
        match self {
            RechargeError::MissingSecret
            | RechargeError::Ledger(_)
            | RechargeError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RechargeError::InvalidSignature => StatusCode::UNAUTHORIZED,
            RechargeError::InvalidPayload(_) | RechargeError::InvalidReference(_) => {
                StatusCode::BAD_REQUEST
            }
            RechargeError::CompanyNotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for RechargeError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Recharge failed: {}", self);
        } else {
            warn!("Recharge rejected: {}", self);
        }

        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

/// Settle one gateway event against the ledger.
pub async fn process_event(
    db: &Database,
    ledger: &Ledger,
    config: &RechargeConfig,
    event: &RechargeEvent,
) -> Result<RechargeOutcome, RechargeError> {
    if event.event != TRANSACTION_UPDATED {
        info!(event = %event.event, "Ignoring gateway event");
        return Ok(RechargeOutcome::Ignored {
            reason: "unsupported event",
        });
    }

    let secret = config
        .events_secret
        .as_deref()
        .ok_or(RechargeError::MissingSecret)?;

    let transaction = event
        .data
        .as_ref()
        .and_then(|d| d.transaction.as_ref())
        .ok_or(RechargeError::InvalidPayload("missing transaction"))?;
    let provided = event
        .signature
        .as_ref()
        .map(|s| s.checksum.as_str())
        .ok_or(RechargeError::InvalidSignature)?;
    let timestamp = event
        .timestamp
        .ok_or(RechargeError::InvalidPayload("missing timestamp"))?;

    if !verify_checksum(transaction, timestamp, secret, provided) {
        return Err(RechargeError::InvalidSignature);
    }

    if transaction.status != APPROVED {
        info!(
            transaction_id = %transaction.id,
            status = %transaction.status,
            "Ignoring transaction that is not approved"
        );
        return Ok(RechargeOutcome::Ignored {
            reason: "not approved",
        });
    }

    let company_id = parse_company_id(&transaction.reference, &config.reference_prefix)
        .ok_or_else(|| RechargeError::InvalidReference(transaction.reference.clone()))?;

    if company::find_company(db.pool(), &company_id).await?.is_none() {
        return Err(RechargeError::CompanyNotFound(company_id));
    }

    let amount = cents_to_credits(transaction.amount_in_cents);
    if amount <= 0 {
        return Err(RechargeError::InvalidPayload("amount must be positive"));
    }

    let result = ledger
        .add(
            &company_id,
            amount,
            TransactionKind::Recharge,
            &format!("Recarga {}", transaction.id),
            Some(&transaction.id),
        )
        .await
        .map_err(|e| match e {
            LedgerError::CompanyNotFound(id) => RechargeError::CompanyNotFound(id),
            other => RechargeError::Ledger(other),
        })?;

    if !result.applied {
        info!(
            transaction_id = %transaction.id,
            company_id = %company_id,
            "Recharge already applied"
        );
    }

    Ok(RechargeOutcome::Credited {
        company_id,
        new_balance: result.new_balance,
        applied: result.applied,
    })
}

/// SHA-256 hex over `id || status || amount_in_cents || timestamp || secret`.
pub fn checksum(transaction: &GatewayTransaction, timestamp: i64, secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(transaction.id.as_bytes());
    hasher.update(transaction.status.as_bytes());
    hasher.update(transaction.amount_in_cents.to_string().as_bytes());
    hasher.update(timestamp.to_string().as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

fn verify_checksum(
    transaction: &GatewayTransaction,
    timestamp: i64,
    secret: &str,
    provided: &str,
) -> bool {
    let expected = checksum(transaction, timestamp, secret);
    let provided = provided.trim().to_ascii_lowercase();
    expected.as_bytes().ct_eq(provided.as_bytes()).into()
}

/// Extract the company id from `prefix-{companyId}-{timestamp}`.
///
/// The id may itself contain hyphens: everything between the first and the last segment
/// is joined back together.
pub fn parse_company_id(reference: &str, prefix: &str) -> Option<String> {
    let segments: Vec<&str> = reference.trim().split('-').collect();
    if segments.len() < 3 || segments[0] != prefix {
        return None;
    }

    let company_id = segments[1..segments.len() - 1].join("-");
    if company_id.is_empty() {
        None
    } else {
        Some(company_id)
    }
}

/// Gateway minor units to ledger credits, rounding half up.
pub fn cents_to_credits(amount_in_cents: i64) -> i64 {
    (amount_in_cents as f64 / 100.0).round() as i64
}

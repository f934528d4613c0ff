//! Credit balance and manual adjustments.

use axum::extract::{Path, State};
use axum::Json;
use database::{company, CreditTransaction, TransactionKind};
use ledger::AddResult;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, ServerError};
use crate::state::AppState;

/// Transactions returned with the balance.
pub const HISTORY_LIMIT: i64 = 50;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditsResponse {
    pub balance: i64,
    pub uses_own_key: bool,
    pub transactions: Vec<CreditTransaction>,
}

#[derive(Debug, Deserialize)]
pub struct AdjustmentRequest {
    pub amount: i64,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Current balance and recent transactions.
pub async fn credits_api(
    State(state): State<AppState>,
    Path(company_id): Path<String>,
) -> Result<Json<CreditsResponse>> {
    ensure_company(&state, &company_id).await?;

    let check = state.ledger.check_balance(&company_id).await?;
    let transactions = state.ledger.history(&company_id, HISTORY_LIMIT).await?;

    Ok(Json(CreditsResponse {
        balance: check.balance,
        uses_own_key: check.uses_own_key,
        transactions,
    }))
}

/// Apply a manual adjustment or refund.
pub async fn adjust_api(
    State(state): State<AppState>,
    Path(company_id): Path<String>,
    Json(req): Json<AdjustmentRequest>,
) -> Result<Json<AddResult>> {
    let kind = match req.kind.trim() {
        "MANUAL_ADJUST" => TransactionKind::ManualAdjust,
        "REFUND" => TransactionKind::Refund,
        other => {
            return Err(ServerError::BadRequest(format!(
                "unsupported adjustment type: {other}"
            )))
        }
    };

    ensure_company(&state, &company_id).await?;

    let description = req
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or(match kind {
            TransactionKind::Refund => "Reembolso",
            _ => "Ajuste manual",
        });

    let result = state
        .ledger
        .add(&company_id, req.amount, kind, description, None)
        .await?;

    info!(
        company_id = %company_id,
        amount = req.amount,
        kind = kind.as_str(),
        "Manual credit adjustment"
    );

    Ok(Json(result))
}

async fn ensure_company(state: &AppState, company_id: &str) -> Result<()> {
    match company::find_company(state.db.pool(), company_id).await? {
        Some(_) => Ok(()),
        None => Err(ServerError::NotFound(format!("Company {company_id}"))),
    }
}

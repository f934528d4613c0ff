//! Payment gateway webhook.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use tracing::debug;

use crate::recharge::{process_event, RechargeError, RechargeEvent, RechargeOutcome};
use crate::state::AppState;

/// Apply a signed recharge event.
///
/// Bodies that are not a recharge event get the same JSON error shape as other rejections.
pub async fn recharge_webhook(
    State(state): State<AppState>,
    body: Result<Json<RechargeEvent>, JsonRejection>,
) -> Result<RechargeOutcome, RechargeError> {
    let Json(event) = body.map_err(|rejection| {
        debug!("Unreadable recharge body: {}", rejection.body_text());
        RechargeError::InvalidPayload("malformed event body")
    })?;

    process_event(&state.db, &state.ledger, &state.recharge, &event).await
}

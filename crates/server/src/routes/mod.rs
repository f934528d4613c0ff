//! Route handlers for the HTTP API.

pub mod credits;
pub mod health;
pub mod inbound;
pub mod recharge;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(health::health))
        // Payment gateway
        .route("/webhooks/recharge", post(recharge::recharge_webhook))
        // API endpoints
        .route(
            "/api/channels/:channel_id/messages/inbound",
            post(inbound::receive_message),
        )
        .route("/api/companies/:company_id/credits", get(credits::credits_api))
        .route(
            "/api/companies/:company_id/credits/adjustments",
            post(credits::adjust_api),
        )
}

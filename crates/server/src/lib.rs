//! HTTP service for Varylo.
//!
//! Receives payment gateway events and inbound channel messages, and exposes the credit
//! balance of each company.
//!
//! | Route | Purpose |
//! |-------|---------|
//! | `GET /health` | liveness |
//! | `POST /webhooks/recharge` | signed payment events |
//! | `POST /api/channels/{id}/messages/inbound` | store a message and run automation |
//! | `GET /api/companies/{id}/credits` | balance and recent transactions |
//! | `POST /api/companies/{id}/credits/adjustments` | manual adjustments and refunds |

pub mod config;
pub mod error;
pub mod recharge;
pub mod routes;
pub mod state;

pub use config::{Config, ConfigError, RechargeConfig};
pub use error::ServerError;
pub use recharge::{RechargeError, RechargeEvent, RechargeOutcome};
pub use routes::router;
pub use state::AppState;

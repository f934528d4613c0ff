//! Application state shared across handlers.

use std::sync::Arc;

use database::Database;
use ledger::Ledger;
use orchestrator::Pipeline;

use crate::config::RechargeConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database connection.
    pub db: Database,
    /// Credit ledger.
    pub ledger: Ledger,
    /// Automation pipeline run for every inbound message.
    pub pipeline: Pipeline,
    /// Payment gateway settings.
    pub recharge: Arc<RechargeConfig>,
}

impl AppState {
    /// Create new application state.
    pub fn new(db: Database, ledger: Ledger, pipeline: Pipeline, recharge: RechargeConfig) -> Self {
        Self {
            db,
            ledger,
            pipeline,
            recharge: Arc::new(recharge),
        }
    }
}

//! Error types for orchestrator operations.

use brain_core::BrainError;
use channel_dispatch::DispatchError;
use database::DatabaseError;
use ledger::LedgerError;
use thiserror::Error;

use crate::crypto::CryptoError;

/// Errors that can occur inside an automation stage.
///
/// The pipeline logs these and moves on to the next stage; they never reach the
/// caller of [`Pipeline::run`](crate::Pipeline::run).
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Reading or writing conversation state failed.
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// Checking or charging credits failed.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// The model provider failed or is not configured.
    #[error("brain error: {0}")]
    Brain(#[from] BrainError),

    /// Sending a reply failed before anything was recorded.
    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// A company-owned key could not be decrypted.
    #[error("credential error: {0}")]
    Crypto(#[from] CryptoError),

    /// The model answered with something unusable.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

//! Failing brain implementation - every call errors.

use async_trait::async_trait;
use brain_core::{Brain, BrainError, Completion, CompletionRequest};
use std::sync::atomic::{AtomicUsize, Ordering};

/// A brain whose provider is always down.
#[derive(Debug, Default)]
pub struct FailingBrain {
    calls: AtomicUsize,
}

impl FailingBrain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of completions attempted.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Brain for FailingBrain {
    async fn complete(&self, _request: CompletionRequest) -> Result<Completion, BrainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(BrainError::Network("connection refused".to_string()))
    }

    fn name(&self) -> &str {
        "FailingBrain"
    }

    fn default_model(&self) -> &str {
        "failing"
    }
}

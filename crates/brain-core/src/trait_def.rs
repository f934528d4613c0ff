//! The Brain trait definition.

use async_trait::async_trait;

use crate::error::BrainError;
use crate::message::{Completion, CompletionRequest};

/// A model provider capable of answering chat-completion requests.
///
/// Calls are single-shot: implementations must not retry, so a failure reaches the
/// caller immediately and the automation pipeline can degrade to its next stage.
#[async_trait]
pub trait Brain: Send + Sync {
    /// Run one chat completion.
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, BrainError>;

    /// Get the name of this brain implementation.
    fn name(&self) -> &str;

    /// Model used when a request does not name one.
    fn default_model(&self) -> &str;
}

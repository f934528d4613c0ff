//! Echo brain implementation - answers with the last user message.

use async_trait::async_trait;
use brain_core::{Brain, BrainError, Completion, CompletionRequest, TokenUsage};

/// A simple brain that echoes the last user message back.
///
/// Useful for exercising the reply path without scripting answers.
#[derive(Debug, Clone, Default)]
pub struct EchoBrain {
    /// Optional prefix to add before the echo.
    prefix: Option<String>,
    usage: TokenUsage,
}

impl EchoBrain {
    /// Create a new EchoBrain with no prefix and zero usage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new EchoBrain with a custom prefix.
    ///
    /// # Example
    ///
    /// ```rust
    /// use mock_brain::EchoBrain;
    ///
    /// let brain = EchoBrain::with_prefix("Echo: ");
    /// // Will respond with "Echo: <last user message>"
    /// ```
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            ..Self::default()
        }
    }

    /// Report the given token usage on every completion.
    pub fn with_usage(mut self, prompt_tokens: u32, completion_tokens: u32) -> Self {
        self.usage = TokenUsage {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        };
        self
    }
}

#[async_trait]
impl Brain for EchoBrain {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, BrainError> {
        let last = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.clone())
            .unwrap_or_default();

        let content = match &self.prefix {
            Some(prefix) => format!("{}{}", prefix, last),
            None => last,
        };

        Ok(Completion {
            model: request.model.unwrap_or_else(|| self.default_model().to_string()),
            content,
            usage: self.usage,
        })
    }

    fn name(&self) -> &str {
        "EchoBrain"
    }

    fn default_model(&self) -> &str {
        "echo"
    }
}

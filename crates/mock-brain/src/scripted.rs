//! Scripted brain implementation - replays queued answers and records requests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use brain_core::{Brain, BrainError, Completion, CompletionRequest, TokenUsage};

/// A brain that returns pre-recorded answers in order.
///
/// Every request is kept so tests can assert on what a stage sent to the model.
/// When the script runs out, `complete` fails with `ProcessingFailed`.
#[derive(Debug, Default)]
pub struct ScriptedBrain {
    script: Mutex<VecDeque<Result<Completion, BrainError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedBrain {
    /// Create a brain with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful answer.
    pub fn reply(self, content: impl Into<String>, prompt_tokens: u32, completion_tokens: u32) -> Self {
        self.push(Ok(Completion {
            model: String::new(),
            content: content.into(),
            usage: TokenUsage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            },
        }));
        self
    }

    /// Queue a failure.
    pub fn fail(self, error: BrainError) -> Self {
        self.push(Err(error));
        self
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Number of completions requested so far.
    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or_default()
    }

    fn push(&self, entry: Result<Completion, BrainError>) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(entry);
        }
    }
}

#[async_trait]
impl Brain for ScriptedBrain {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, BrainError> {
        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.default_model().to_string());

        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }

        let next = self
            .script
            .lock()
            .ok()
            .and_then(|mut script| script.pop_front())
            .unwrap_or_else(|| Err(BrainError::ProcessingFailed("script exhausted".to_string())));

        next.map(|mut completion| {
            if completion.model.is_empty() {
                completion.model = model;
            }
            completion
        })
    }

    fn name(&self) -> &str {
        "ScriptedBrain"
    }

    fn default_model(&self) -> &str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brain_core::ChatMessage;

    #[tokio::test]
    async fn test_answers_in_order_then_exhausts() {
        let brain = ScriptedBrain::new()
            .reply("uno", 10, 2)
            .fail(BrainError::Timeout);

        let first = brain
            .complete(CompletionRequest::new(vec![ChatMessage::user("a")]).with_model("gpt-4o"))
            .await
            .unwrap();
        assert_eq!(first.content, "uno");
        assert_eq!(first.model, "gpt-4o");
        assert_eq!(first.usage.total_tokens, 12);

        let second = brain.complete(CompletionRequest::new(vec![])).await;
        assert!(matches!(second, Err(BrainError::Timeout)));

        let third = brain.complete(CompletionRequest::new(vec![])).await;
        assert!(matches!(third, Err(BrainError::ProcessingFailed(_))));

        assert_eq!(brain.call_count(), 3);
        assert_eq!(brain.requests()[0].messages[0].content, "a");
    }
}

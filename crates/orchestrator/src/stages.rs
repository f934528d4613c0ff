//! Stage interfaces the pipeline sequences.

use async_trait::async_trait;
use chatbot_flow::FlowOutcome;
use database::ConversationInsight;

use crate::error::OrchestratorError;

/// Scripted chatbot flow.
#[async_trait]
pub trait ChatbotStage: Send + Sync {
    async fn handle(&self, conversation_id: &str, text: &str)
        -> Result<FlowOutcome, OrchestratorError>;
}

/// Why the AI agent did or did not answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentOutcome {
    /// A reply was sent; `cost` is `None` when the company used its own key.
    Replied { cost: Option<i64> },
    /// The channel turned the agent off.
    Disabled,
    /// No credits and no own key.
    NoCredits,
    /// The provider is missing, failed or answered with nothing.
    ProviderUnavailable,
}

impl AgentOutcome {
    pub fn handled(&self) -> bool {
        matches!(self, AgentOutcome::Replied { .. })
    }
}

/// LLM responder.
#[async_trait]
pub trait AgentStage: Send + Sync {
    async fn respond(&self, conversation_id: &str, text: &str)
        -> Result<AgentOutcome, OrchestratorError>;
}

/// Best-effort conversation analysis; `None` whenever nothing was produced.
#[async_trait]
pub trait AnalyzerStage: Send + Sync {
    async fn analyze(&self, conversation_id: &str) -> Option<ConversationInsight>;
}

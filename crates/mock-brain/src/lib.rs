//! Mock model providers for Varylo tests.
//!
//! This crate provides mock implementations of the `Brain` trait:
//! - `EchoBrain` - Echoes the last user message back
//! - `ScriptedBrain` - Replays queued answers and records every request
//! - `FailingBrain` - Always fails, like an unreachable provider
//!
//! For production, use the `openai-brain` crate instead.
//!
//! # Example
//!
//! ```rust
//! use mock_brain::{Brain, ChatMessage, CompletionRequest, ScriptedBrain};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mock_brain::BrainError> {
//!     let brain = ScriptedBrain::new().reply("Hola, ¿en qué te ayudo?", 120, 12);
//!
//!     let request = CompletionRequest::new(vec![ChatMessage::user("Hola")]);
//!     let completion = brain.complete(request).await?;
//!     assert_eq!(completion.usage.total_tokens, 132);
//!     Ok(())
//! }
//! ```

mod echo;
mod failing;
mod scripted;

// Re-export brain-core types for convenience
pub use brain_core::{
    async_trait, Brain, BrainError, ChatMessage, Completion, CompletionRequest, TokenUsage,
};

pub use echo::EchoBrain;
pub use failing::FailingBrain;
pub use scripted::ScriptedBrain;

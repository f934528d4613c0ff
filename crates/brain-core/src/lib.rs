//! Core trait and types for model providers.
//!
//! This crate provides the shared interface used by the AI agent and the
//! conversation analyzer to talk to a language model. It defines:
//!
//! - [`Brain`] - The trait that all provider implementations must implement
//! - [`CompletionRequest`] / [`Completion`] - Chat-completion input and output
//! - [`TokenUsage`] - Token counts reported back for billing
//! - [`BrainError`] - Error types for provider calls
//!
//! # Example
//!
//! ```rust
//! use brain_core::{async_trait, Brain, BrainError, Completion, CompletionRequest, TokenUsage};
//!
//! struct FixedBrain;
//!
//! #[async_trait]
//! impl Brain for FixedBrain {
//!     async fn complete(&self, request: CompletionRequest) -> Result<Completion, BrainError> {
//!         Ok(Completion {
//!             model: request.model.unwrap_or_else(|| "fixed".to_string()),
//!             content: "Hola!".to_string(),
//!             usage: TokenUsage::default(),
//!         })
//!     }
//!
//!     fn name(&self) -> &str {
//!         "FixedBrain"
//!     }
//!
//!     fn default_model(&self) -> &str {
//!         "fixed"
//!     }
//! }
//! ```

mod error;
mod message;
mod trait_def;

pub use error::BrainError;
pub use message::{ChatMessage, Completion, CompletionRequest, ResponseFormat, TokenUsage};
pub use trait_def::Brain;

// Re-export async_trait for convenience
pub use async_trait::async_trait;

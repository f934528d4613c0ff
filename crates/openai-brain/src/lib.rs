//! OpenAI-compatible model provider.
//!
//! This crate provides a [`Brain`](brain_core::Brain) implementation that calls the
//! chat-completions endpoint of OpenAI (or any compatible API) with bearer-token auth.
//!
//! # Usage
//!
//! ```rust,no_run
//! use openai_brain::{OpenAiBrain, OpenAiBrainConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Platform provider from OPENAI_* environment variables
//!     let platform = OpenAiBrain::from_env()?;
//!
//!     // Short-lived provider for a company that brings its own key
//!     let company = OpenAiBrain::new(platform.config().with_api_key("sk-company"))?;
//!     # let _ = company;
//!     Ok(())
//! }
//! ```

mod api_types;
mod brain;
mod config;

pub use brain::OpenAiBrain;
pub use config::{OpenAiBrainConfig, OpenAiBrainConfigBuilder};

// Re-export brain-core types for convenience
pub use brain_core::{async_trait, Brain, BrainError, Completion, CompletionRequest};

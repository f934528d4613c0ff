//! Automation pipeline for inbound messages.
//!
//! This crate decides who answers an inbound message: the company's scripted chatbot
//! flow, the AI agent, or nobody (in which case the conversation analyzer still
//! refreshes the conversation's insight).
//!
//! # Architecture
//!
//! ```text
//! Inbound message (stored by the server)
//!          ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        PIPELINE                             │
//! │                                                             │
//! │  ChatbotResponder  → chatbot-flow `advance`, reply, position│
//! │  AiAgent           → credit check, provider, reply, billing │
//! │  ConversationAnalyzer → transcript, JSON analysis, insight  │
//! │                                                             │
//! │  Order comes from the channel's automation priority.        │
//! └─────────────────────────────────────────────────────────────┘
//!          ↓
//! ChannelDispatcher (WhatsApp / Instagram) + Ledger
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use channel_dispatch::{ChannelDispatcher, DispatchConfig, HttpMessagingClient};
//! use database::{AutomationPriority, Database};
//! use ledger::Ledger;
//! use orchestrator::{KeyCipher, OpenAiProviders, Pipeline, ProviderResolver};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::connect("sqlite:varylo.db?mode=rwc").await?;
//! let config = DispatchConfig::from_env();
//! let dispatcher = ChannelDispatcher::new(
//!     db.clone(),
//!     Arc::new(HttpMessagingClient::new(config.clone())?),
//!     config,
//! );
//! let providers = ProviderResolver::new(
//!     Arc::new(OpenAiProviders::from_env()),
//!     KeyCipher::from_env("CREDENTIALS_KEY").ok(),
//! );
//! let pipeline = Pipeline::standard(db.clone(), Ledger::new(db), dispatcher, providers);
//!
//! pipeline.run("conv-1", "Hola", AutomationPriority::ChatbotFirst).await;
//! # Ok(())
//! # }
//! ```

mod agent;
mod analyzer;
mod billing;
mod chatbot;
mod crypto;
mod error;
mod pipeline;
mod provider;
mod settings;
mod stages;

pub use agent::{AiAgent, HISTORY_LIMIT};
pub use analyzer::{ConversationAnalyzer, InsightFlags, MAX_TOPICS, TRANSCRIPT_LIMIT};
pub use chatbot::ChatbotResponder;
pub use crypto::{CryptoError, KeyCipher};
pub use error::OrchestratorError;
pub use pipeline::{Pipeline, PipelineReport, Stage};
pub use provider::{FixedProviders, OpenAiProviders, ProviderFactory, ProviderResolver, ResolvedProvider};
pub use settings::{AgentSettings, AI_SENDER_NAME, BOT_SENDER_NAME, DEFAULT_SYSTEM_PROMPT};
pub use stages::{AgentOutcome, AgentStage, AnalyzerStage, ChatbotStage};

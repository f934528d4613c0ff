//! Outbound message delivery for Varylo channels.
//!
//! [`ChannelDispatcher`] resolves a conversation's channel and contact, delivers the text
//! through a [`MessagingClient`] and records the OUTBOUND message.
//!
//! - WhatsApp uses the channel's `phoneNumberId`/`accessToken`, falling back to the
//!   platform sender from [`DispatchConfig`]
//! - Instagram requires the channel's own token
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use channel_dispatch::{ChannelDispatcher, DispatchConfig, HttpMessagingClient};
//! use database::Database;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::connect("sqlite:varylo.db?mode=rwc").await?;
//! let config = DispatchConfig::from_env();
//! let client = Arc::new(HttpMessagingClient::new(config.clone())?);
//! let dispatcher = ChannelDispatcher::new(db, client, config);
//!
//! dispatcher.send("conv-1", "acme", "¡Hola!", Some("Bot")).await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod dispatcher;
mod error;
mod types;

pub use client::{HttpMessagingClient, MessagingClient, RecordingClient, SentMessage};
pub use config::DispatchConfig;
pub use dispatcher::ChannelDispatcher;
pub use error::DispatchError;
pub use types::{
    DeliveryTarget, DispatchOutcome, InstagramCredentials, SendResult, WhatsAppCredentials,
};

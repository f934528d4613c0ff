//! Messaging provider clients.

use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::DispatchConfig;
use crate::error::DispatchError;
use crate::types::{DeliveryTarget, SendResult};

/// Sends one text message through a messaging provider.
///
/// Single-shot: implementations do not retry.
#[async_trait]
pub trait MessagingClient: Send + Sync {
    async fn send_text(
        &self,
        target: &DeliveryTarget,
        recipient_id: &str,
        text: &str,
    ) -> Result<SendResult, DispatchError>;
}

/// Client for the Meta Graph messaging APIs.
#[derive(Clone)]
pub struct HttpMessagingClient {
    http: Client,
    config: DispatchConfig,
}

impl HttpMessagingClient {
    /// Create a client with the given configuration.
    pub fn new(config: DispatchConfig) -> Result<Self, DispatchError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    /// Build the URL, bearer token and JSON body for a delivery.
    fn request_parts(
        &self,
        target: &DeliveryTarget,
        recipient_id: &str,
        text: &str,
    ) -> (String, String, Value) {
        match target {
            DeliveryTarget::WhatsApp(credentials) => {
                let to = recipient_id.strip_prefix('+').unwrap_or(recipient_id);
                (
                    self.config.whatsapp_messages_url(&credentials.phone_number_id),
                    credentials.access_token.clone(),
                    json!({
                        "messaging_product": "whatsapp",
                        "recipient_type": "individual",
                        "to": to,
                        "type": "text",
                        "text": {
                            "preview_url": false,
                            "body": text
                        }
                    }),
                )
            }
            DeliveryTarget::Instagram(credentials) => (
                self.config.instagram_messages_url(),
                credentials.access_token.clone(),
                json!({
                    "recipient": { "id": recipient_id },
                    "message": { "text": text }
                }),
            ),
        }
    }
}

#[async_trait]
impl MessagingClient for HttpMessagingClient {
    async fn send_text(
        &self,
        target: &DeliveryTarget,
        recipient_id: &str,
        text: &str,
    ) -> Result<SendResult, DispatchError> {
        let (url, token, body) = self.request_parts(target, recipient_id, text);
        debug!("Sending {} message to {}", target.channel_type().as_str(), recipient_id);

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DispatchError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let provider_response = response.json::<Value>().await.unwrap_or(Value::Null);
        Ok(SendResult { provider_response })
    }
}

/// A delivered message as seen by [`RecordingClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub target: DeliveryTarget,
    pub recipient_id: String,
    pub text: String,
}

/// In-memory client that records every delivery instead of calling a provider.
#[derive(Debug, Default)]
pub struct RecordingClient {
    sent: Mutex<Vec<SentMessage>>,
    fail: bool,
}

impl RecordingClient {
    /// A client that accepts every message.
    pub fn new() -> Self {
        Self::default()
    }

    /// A client that records every attempt and then reports a provider error.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Messages received so far, oldest first.
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Texts received so far, oldest first.
    pub fn texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|m| m.text).collect()
    }
}

#[async_trait]
impl MessagingClient for RecordingClient {
    async fn send_text(
        &self,
        target: &DeliveryTarget,
        recipient_id: &str,
        text: &str,
    ) -> Result<SendResult, DispatchError> {
        let count = {
            let mut sent = self.sent.lock().unwrap_or_else(|e| e.into_inner());
            sent.push(SentMessage {
                target: target.clone(),
                recipient_id: recipient_id.to_string(),
                text: text.to_string(),
            });
            sent.len()
        };

        if self.fail {
            return Err(DispatchError::Api {
                status: 503,
                body: "provider unavailable".to_string(),
            });
        }

        Ok(SendResult {
            provider_response: json!({ "messages": [{ "id": format!("recorded-{count}") }] }),
        })
    }
}

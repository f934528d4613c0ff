//! Delivery targets and results.

use database::{Channel, ChannelType};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Credentials of a WhatsApp Cloud API sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhatsAppCredentials {
    pub phone_number_id: String,
    pub access_token: String,
}

/// Credentials of an Instagram professional account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstagramCredentials {
    pub access_token: String,
}

/// Where and how one message is delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryTarget {
    WhatsApp(WhatsAppCredentials),
    Instagram(InstagramCredentials),
}

impl DeliveryTarget {
    /// Channel type this target delivers to.
    pub fn channel_type(&self) -> ChannelType {
        match self {
            DeliveryTarget::WhatsApp(_) => ChannelType::WhatsApp,
            DeliveryTarget::Instagram(_) => ChannelType::Instagram,
        }
    }
}

/// Provider acknowledgement of a delivered message.
#[derive(Debug, Clone, PartialEq)]
pub struct SendResult {
    /// Raw provider response body.
    pub provider_response: Value,
}

impl SendResult {
    /// Provider-assigned message ID, when the response carries one.
    pub fn message_id(&self) -> Option<&str> {
        self.provider_response
            .pointer("/messages/0/id")
            .or_else(|| self.provider_response.get("message_id"))
            .and_then(Value::as_str)
    }
}

/// What happened to one `send` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Delivered and recorded.
    Delivered { message_id: i64 },
    /// Delivery failed, the message was still recorded.
    Failed { message_id: i64, reason: String },
    /// Nothing was sent or recorded.
    Skipped { reason: String },
}

impl DispatchOutcome {
    /// ID of the recorded outbound message, if one was stored.
    pub fn message_id(&self) -> Option<i64> {
        match self {
            DispatchOutcome::Delivered { message_id } | DispatchOutcome::Failed { message_id, .. } => {
                Some(*message_id)
            }
            DispatchOutcome::Skipped { .. } => None,
        }
    }

    /// Whether the provider accepted the message.
    pub fn is_delivered(&self) -> bool {
        matches!(self, DispatchOutcome::Delivered { .. })
    }
}

/// Credentials stored in a channel's config, by channel type.
///
/// WhatsApp reads `phoneNumberId` + `accessToken`; Instagram reads `accessToken`
/// (or `pageAccessToken`). Blank values count as missing.
pub(crate) fn channel_credentials(channel: &Channel) -> Option<DeliveryTarget> {
    let config = channel.config();
    let field = |name: &str| {
        config
            .get(name)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    };

    match channel.kind()? {
        ChannelType::WhatsApp => Some(DeliveryTarget::WhatsApp(WhatsAppCredentials {
            phone_number_id: field("phoneNumberId")?,
            access_token: field("accessToken")?,
        })),
        ChannelType::Instagram => Some(DeliveryTarget::Instagram(InstagramCredentials {
            access_token: field("accessToken").or_else(|| field("pageAccessToken"))?,
        })),
    }
}

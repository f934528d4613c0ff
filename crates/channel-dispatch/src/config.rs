//! Configuration types for channel-dispatch.

use std::env;
use std::time::Duration;

use crate::types::WhatsAppCredentials;

/// Settings shared by every outbound delivery.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Messaging API base URL (e.g., "https://graph.facebook.com").
    pub graph_url: String,
    /// API version path segment (e.g., "v21.0").
    pub graph_version: String,
    /// Platform WhatsApp sender used when a channel has no credentials of its own.
    pub platform_whatsapp: Option<WhatsAppCredentials>,
    /// Upper bound on one delivery request.
    pub timeout: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            graph_url: "https://graph.facebook.com".to_string(),
            graph_version: "v21.0".to_string(),
            platform_whatsapp: None,
            timeout: Duration::from_secs(15),
        }
    }
}

impl DispatchConfig {
    /// Create configuration from environment variables.
    ///
    /// Optional environment variables:
    /// - `META_GRAPH_URL` - API base URL (default: https://graph.facebook.com)
    /// - `META_GRAPH_VERSION` - API version (default: v21.0)
    /// - `WHATSAPP_PHONE_NUMBER_ID` + `WHATSAPP_ACCESS_TOKEN` - platform sender
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let platform_whatsapp = match (
            env::var("WHATSAPP_PHONE_NUMBER_ID"),
            env::var("WHATSAPP_ACCESS_TOKEN"),
        ) {
            (Ok(phone_number_id), Ok(access_token))
                if !phone_number_id.is_empty() && !access_token.is_empty() =>
            {
                Some(WhatsAppCredentials {
                    phone_number_id,
                    access_token,
                })
            }
            _ => None,
        };

        Self {
            graph_url: env::var("META_GRAPH_URL").unwrap_or(defaults.graph_url),
            graph_version: env::var("META_GRAPH_VERSION").unwrap_or(defaults.graph_version),
            platform_whatsapp,
            timeout: defaults.timeout,
        }
    }

    /// Use the given platform WhatsApp sender.
    pub fn with_platform_whatsapp(mut self, credentials: WhatsAppCredentials) -> Self {
        self.platform_whatsapp = Some(credentials);
        self
    }

    /// WhatsApp Cloud API messages endpoint for a phone number.
    pub fn whatsapp_messages_url(&self, phone_number_id: &str) -> String {
        format!(
            "{}/{}/{}/messages",
            self.graph_url.trim_end_matches('/'),
            self.graph_version,
            phone_number_id
        )
    }

    /// Instagram messaging endpoint for the page owning the token.
    pub fn instagram_messages_url(&self) -> String {
        format!(
            "{}/{}/me/messages",
            self.graph_url.trim_end_matches('/'),
            self.graph_version
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let config = DispatchConfig {
            graph_url: "http://localhost:9000/".to_string(),
            ..DispatchConfig::default()
        };

        assert_eq!(
            config.whatsapp_messages_url("12345"),
            "http://localhost:9000/v21.0/12345/messages"
        );
        assert_eq!(
            config.instagram_messages_url(),
            "http://localhost:9000/v21.0/me/messages"
        );
    }
}

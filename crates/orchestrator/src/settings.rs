//! Per-channel AI agent settings, read from `configJson.aiAgent`.

use database::Channel;
use serde::Deserialize;

/// Prompt used when the channel does not define one.
pub const DEFAULT_SYSTEM_PROMPT: &str = "Eres un asistente de atención al cliente. \
Responde de forma breve, amable y en el idioma del cliente. \
Si no sabes la respuesta, ofrece comunicar al cliente con un asesor humano.";

/// Sender name recorded on AI replies.
pub const AI_SENDER_NAME: &str = "Asistente IA";

/// Sender name recorded on chatbot replies.
pub const BOT_SENDER_NAME: &str = "Bot";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentSettings {
    pub enabled: bool,
    pub system_prompt: Option<String>,
    pub model: Option<String>,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            system_prompt: None,
            model: None,
        }
    }
}

impl AgentSettings {
    /// Settings for a channel; missing or malformed settings give the defaults.
    pub fn for_channel(channel: &Channel) -> Self {
        channel
            .config()
            .get("aiAgent")
            .cloned()
            .and_then(|value| serde_json::from_value(value).ok())
            .unwrap_or_default()
    }

    pub fn system_prompt(&self) -> &str {
        self.system_prompt
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_SYSTEM_PROMPT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn channel(config: serde_json::Value) -> Channel {
        Channel {
            id: "ch".to_string(),
            company_id: "acme".to_string(),
            channel_type: "WHATSAPP".to_string(),
            status: "CONNECTED".to_string(),
            config_json: config.to_string(),
            automation_priority: "CHATBOT_FIRST".to_string(),
            created_at: String::new(),
        }
    }

    #[test]
    fn test_defaults() {
        let settings = AgentSettings::for_channel(&channel(json!({})));
        assert!(settings.enabled);
        assert_eq!(settings.system_prompt(), DEFAULT_SYSTEM_PROMPT);
    }

    #[test]
    fn test_partial_settings() {
        let settings = AgentSettings::for_channel(&channel(json!({
            "aiAgent": {"enabled": false, "systemPrompt": "Vende zapatos", "model": "gpt-4o"}
        })));
        assert!(!settings.enabled);
        assert_eq!(settings.system_prompt(), "Vende zapatos");
        assert_eq!(settings.model.as_deref(), Some("gpt-4o"));

        let settings = AgentSettings::for_channel(&channel(json!({"aiAgent": {"model": "gpt-4.1"}})));
        assert!(settings.enabled);
    }
}

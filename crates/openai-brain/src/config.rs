//! Configuration for OpenAiBrain.

use brain_core::BrainError;
use std::env;
use std::time::Duration;

/// Default request bound for a single completion.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Configuration for OpenAiBrain.
#[derive(Debug, Clone)]
pub struct OpenAiBrainConfig {
    /// API base URL (without `/v1`).
    pub api_url: String,

    /// API key for authentication.
    pub api_key: String,

    /// Model used when a request does not name one.
    pub model: String,

    /// Default temperature (0.0 - 2.0).
    pub temperature: Option<f32>,

    /// Maximum tokens for a response.
    pub max_tokens: Option<u32>,

    /// Upper bound on one request, connection included.
    pub timeout: Duration,
}

impl Default for OpenAiBrainConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            temperature: Some(0.7),
            max_tokens: Some(1024),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl OpenAiBrainConfig {
    /// Create configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `OPENAI_API_KEY` - Platform API key
    ///
    /// Optional environment variables are listed on [`Self::from_env_without_key`].
    pub fn from_env() -> Result<Self, BrainError> {
        let config = Self::from_env_without_key();
        if config.api_key.trim().is_empty() {
            return Err(BrainError::Configuration("OPENAI_API_KEY not set".to_string()));
        }
        Ok(config)
    }

    /// Read provider settings from the environment, leaving the key empty when
    /// `OPENAI_API_KEY` is unset (companies may still bring their own).
    ///
    /// Optional environment variables:
    /// - `OPENAI_API_URL` - API URL (default: https://api.openai.com)
    /// - `OPENAI_MODEL` - Model name (default: gpt-4o-mini)
    /// - `OPENAI_TEMPERATURE` - Temperature (default: 0.7)
    /// - `OPENAI_MAX_TOKENS` - Max tokens (default: 1024)
    /// - `OPENAI_TIMEOUT_SECS` - Request bound in seconds (default: 60)
    pub fn from_env_without_key() -> Self {
        let defaults = Self::default();

        let api_key = env::var("OPENAI_API_KEY").unwrap_or_default();

        let api_url = env::var("OPENAI_API_URL").unwrap_or(defaults.api_url);

        let model = env::var("OPENAI_MODEL").unwrap_or(defaults.model);

        let temperature = env::var("OPENAI_TEMPERATURE")
            .ok()
            .and_then(|v| v.parse().ok())
            .or(defaults.temperature);

        let max_tokens = env::var("OPENAI_MAX_TOKENS")
            .ok()
            .and_then(|v| v.parse().ok())
            .or(defaults.max_tokens);

        let timeout = env::var("OPENAI_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);

        Self {
            api_url,
            api_key,
            model,
            temperature,
            max_tokens,
            timeout,
        }
    }

    /// Same settings, different credentials.
    pub fn with_api_key(&self, api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..self.clone()
        }
    }

    /// Create a new config builder.
    pub fn builder() -> OpenAiBrainConfigBuilder {
        OpenAiBrainConfigBuilder::default()
    }
}

/// Builder for OpenAiBrainConfig.
#[derive(Debug, Default)]
pub struct OpenAiBrainConfigBuilder {
    config: OpenAiBrainConfig,
}

impl OpenAiBrainConfigBuilder {
    /// Set the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    /// Set the API URL.
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = url.into();
        self
    }

    /// Set the model name.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set the temperature.
    pub fn temperature(mut self, temp: f32) -> Self {
        self.config.temperature = Some(temp);
        self
    }

    /// Set the max tokens.
    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.config.max_tokens = Some(tokens);
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> OpenAiBrainConfig {
        self.config
    }
}

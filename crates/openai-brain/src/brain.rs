//! OpenAiBrain implementation using the chat-completions API.

use brain_core::{async_trait, Brain, BrainError, Completion, CompletionRequest, ResponseFormat, TokenUsage};
use reqwest::Client;
use tracing::debug;

use crate::api_types::{ApiError, ChatCompletionRequest, ChatCompletionResponse, ResponseFormatParam};
use crate::config::OpenAiBrainConfig;

/// A model provider backed by an OpenAI-compatible chat-completions endpoint.
///
/// Stateless: conversation context travels in each request.
pub struct OpenAiBrain {
    client: Client,
    config: OpenAiBrainConfig,
}

impl OpenAiBrain {
    /// Create a new OpenAiBrain with the given configuration.
    pub fn new(config: OpenAiBrainConfig) -> Result<Self, BrainError> {
        if config.api_key.trim().is_empty() {
            return Err(BrainError::Configuration("API key is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BrainError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        debug!("OpenAiBrain initialized with model: {}", config.model);

        Ok(Self { client, config })
    }

    /// Create an OpenAiBrain from environment variables.
    ///
    /// See [`OpenAiBrainConfig::from_env`] for required environment variables.
    pub fn from_env() -> Result<Self, BrainError> {
        Self::new(OpenAiBrainConfig::from_env()?)
    }

    /// Get the configuration.
    pub fn config(&self) -> &OpenAiBrainConfig {
        &self.config
    }

    /// Build the wire request for a completion.
    fn build_request(&self, request: CompletionRequest) -> ChatCompletionRequest {
        let response_format = match request.response_format {
            ResponseFormat::Text => None,
            format => Some(ResponseFormatParam {
                format_type: format.as_str(),
            }),
        };

        ChatCompletionRequest {
            model: request.model.unwrap_or_else(|| self.config.model.clone()),
            messages: request.messages,
            temperature: request.temperature.or(self.config.temperature),
            max_tokens: self.config.max_tokens,
            response_format,
        }
    }
}

#[async_trait]
impl Brain for OpenAiBrain {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, BrainError> {
        let url = format!("{}/v1/chat/completions", self.config.api_url.trim_end_matches('/'));
        let body = self.build_request(request);
        let requested_model = body.model.clone();

        debug!(
            "Sending completion request (model: {}, messages: {})",
            body.model,
            body.messages.len()
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BrainError::Timeout
                } else {
                    BrainError::Network(format!("Failed to send request: {}", e))
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(api_error(status.as_u16(), &error_text));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| BrainError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        into_completion(completion, requested_model)
    }

    fn name(&self) -> &str {
        "OpenAiBrain"
    }

    fn default_model(&self) -> &str {
        &self.config.model
    }
}

fn api_error(status: u16, body: &str) -> BrainError {
    let message = serde_json::from_str::<ApiError>(body)
        .map(|api_error| api_error.error.message)
        .unwrap_or_else(|_| body.to_string());

    BrainError::ProcessingFailed(format!("API error ({}): {}", status, message))
}

fn into_completion(
    response: ChatCompletionResponse,
    requested_model: String,
) -> Result<Completion, BrainError> {
    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| BrainError::InvalidResponse("No content in response".to_string()))?;

    let usage = response
        .usage
        .map(|usage| TokenUsage {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        })
        .unwrap_or_default();

    let model = if response.model.is_empty() {
        requested_model
    } else {
        response.model
    };

    Ok(Completion {
        model,
        content,
        usage,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use brain_core::ChatMessage;

    fn brain() -> OpenAiBrain {
        let config = OpenAiBrainConfig::builder()
            .api_key("sk-test")
            .model("gpt-4o-mini")
            .temperature(0.7)
            .build();
        OpenAiBrain::new(config).unwrap()
    }

    #[test]
    fn test_empty_key_is_rejected() {
        let result = OpenAiBrain::new(OpenAiBrainConfig::default());
        assert!(matches!(result, Err(BrainError::Configuration(_))));
    }

    #[test]
    fn test_build_request_uses_defaults() {
        let request = CompletionRequest::new(vec![ChatMessage::user("hola")]);
        let body = brain().build_request(request);

        assert_eq!(body.model, "gpt-4o-mini");
        assert_eq!(body.temperature, Some(0.7));
        assert!(body.response_format.is_none());

        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("response_format").is_none());
        assert_eq!(json["messages"][0]["role"], "user");
    }

    #[test]
    fn test_build_request_json_mode_and_overrides() {
        let request = CompletionRequest::new(vec![ChatMessage::system("analiza")])
            .with_model("gpt-4.1")
            .with_temperature(0.2)
            .json();
        let body = brain().build_request(request);

        assert_eq!(body.model, "gpt-4.1");
        assert_eq!(body.temperature, Some(0.2));

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["response_format"]["type"], "json_object");
    }

    #[test]
    fn test_into_completion_reads_usage() {
        let response: ChatCompletionResponse = serde_json::from_str(
            r#"{
                "model": "gpt-4o-mini-2024-07-18",
                "choices": [{"message": {"role": "assistant", "content": "Hola!"}}],
                "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
            }"#,
        )
        .unwrap();

        let completion = into_completion(response, "gpt-4o-mini".to_string()).unwrap();
        assert_eq!(completion.content, "Hola!");
        assert_eq!(completion.model, "gpt-4o-mini-2024-07-18");
        assert_eq!(completion.usage.total_tokens, 15);
    }

    #[test]
    fn test_into_completion_without_content_fails() {
        let response: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"content": null}}]}"#).unwrap();

        let result = into_completion(response, "gpt-4o-mini".to_string());
        assert!(matches!(result, Err(BrainError::InvalidResponse(_))));
    }

    #[test]
    fn test_api_error_message_is_extracted() {
        let err = api_error(
            401,
            r#"{"error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}}"#,
        );
        assert_eq!(
            err.to_string(),
            "processing failed: API error (401): Incorrect API key provided"
        );
    }
}

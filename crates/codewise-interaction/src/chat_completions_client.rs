//! ChatCompletionsClient - REST client for OpenAI-compatible chat completion APIs.
//!
//! Defaults target Groq. Credential priority:
//! ~/.config/codewise/secret.json > environment variables.

use async_trait::async_trait;
use codewise_core::CodewiseError;
use codewise_core::config::{ModelSettings, SecretConfig};
use codewise_core::model::{ModelClient, ModelError};
use codewise_infrastructure::storage::SecretStorage;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable holding the API key when secret.json has none.
pub const ENV_API_KEY: &str = "GROQ_API_KEY";

/// Model client that talks to a `/chat/completions` endpoint.
#[derive(Clone)]
pub struct ChatCompletionsClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    timeout: Duration,
}

impl std::fmt::Debug for ChatCompletionsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl ChatCompletionsClient {
    /// Builds a client from the model settings and an explicit API key.
    pub fn from_settings(
        settings: &ModelSettings,
        api_key: impl Into<String>,
    ) -> Result<Self, CodewiseError> {
        let timeout = Duration::from_secs(settings.timeout_secs);
        let client = Client::builder().timeout(timeout).build().map_err(|err| {
            CodewiseError::config(format!("Failed to build HTTP client: {err}"))
        })?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: settings.model_name.clone(),
            temperature: settings.temperature,
            timeout,
        })
    }

    /// Loads credentials from ~/.config/codewise/secret.json or the environment.
    ///
    /// Priority:
    /// 1. `groq` section of secret.json
    /// 2. `GROQ_API_KEY` (model name from `settings`, which already carries
    ///    any `GROQ_MODEL_NAME` override)
    pub fn try_from_env(settings: &ModelSettings) -> Result<Self, CodewiseError> {
        let secrets = match SecretStorage::new() {
            Ok(storage) => storage.load_optional().unwrap_or_else(|err| {
                tracing::warn!(
                    "[ChatCompletionsClient] Ignoring unreadable {}: {}",
                    storage.path().display(),
                    err
                );
                None
            }),
            Err(_) => None,
        };
        Self::try_from_sources(settings, secrets.as_ref(), std::env::var(ENV_API_KEY).ok())
    }

    /// Resolves credentials from already-loaded sources.
    pub fn try_from_sources(
        settings: &ModelSettings,
        secrets: Option<&SecretConfig>,
        env_api_key: Option<String>,
    ) -> Result<Self, CodewiseError> {
        if let Some(groq) = secrets.and_then(|config| config.groq.as_ref()) {
            let client = Self::from_settings(settings, groq.api_key.clone())?;
            return Ok(match &groq.model_name {
                Some(model) => client.with_model(model.clone()),
                None => client,
            });
        }

        let api_key = env_api_key
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                CodewiseError::config(format!(
                    "{ENV_API_KEY} not found in ~/.config/codewise/secret.json or environment variables"
                ))
            })?;
        Self::from_settings(settings, api_key)
    }

    /// Overrides the model after construction.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn build_request<'a>(&'a self, prompt: &'a str) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        }
    }

    async fn send_request(&self, body: &ChatCompletionRequest<'_>) -> Result<String, ModelError> {
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    ModelError::Timeout(self.timeout)
                } else {
                    ModelError::Transport(format!("Chat completions request failed: {err}"))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            return Err(map_http_error(status, body_text));
        }

        let parsed: ChatCompletionResponse = response.json().await.map_err(|err| {
            ModelError::MalformedResponse(format!("Failed to parse chat completions response: {err}"))
        })?;

        extract_text_response(parsed)
    }
}

#[async_trait]
impl ModelClient for ChatCompletionsClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String, ModelError> {
        let request = self.build_request(prompt);
        tracing::debug!(
            model = %self.model,
            prompt_len = prompt.len(),
            "[ChatCompletionsClient] POST {}",
            self.endpoint()
        );
        self.send_request(&request).await
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

fn extract_text_response(response: ChatCompletionResponse) -> Result<String, ModelError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(ModelError::EmptyResponse)
}

fn map_http_error(status: StatusCode, body: String) -> ModelError {
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|wrapper| wrapper.error.message)
        .unwrap_or(body);

    let retryable = matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    );

    ModelError::Http {
        status: status.as_u16(),
        message,
        retryable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codewise_core::config::{DEFAULT_MODEL_NAME, GroqConfig};

    fn client() -> ChatCompletionsClient {
        ChatCompletionsClient::from_settings(&ModelSettings::default(), "gsk-test").unwrap()
    }

    #[test]
    fn test_request_body_shape() {
        let client = client();
        let body = serde_json::to_value(client.build_request("Explain this")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "model": DEFAULT_MODEL_NAME,
                "messages": [{ "role": "user", "content": "Explain this" }],
                "temperature": 0.0
            })
        );
    }

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let settings = ModelSettings {
            base_url: "http://localhost:8080/v1/".to_string(),
            ..ModelSettings::default()
        };
        let client = ChatCompletionsClient::from_settings(&settings, "key").unwrap();
        assert_eq!(client.endpoint(), "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn test_map_http_error_extracts_message() {
        let err = map_http_error(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error": {"message": "Rate limit reached", "type": "tokens"}}"#.to_string(),
        );
        assert_eq!(
            err,
            ModelError::Http {
                status: 429,
                message: "Rate limit reached".to_string(),
                retryable: true,
            }
        );
    }

    #[test]
    fn test_map_http_error_client_errors_not_retryable() {
        let err = map_http_error(StatusCode::UNAUTHORIZED, "invalid api key".to_string());
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("invalid api key"));
    }

    #[test]
    fn test_extract_text_response() {
        let ok: ChatCompletionResponse = serde_json::from_str(
            r#"{"choices": [{"message": {"role": "assistant", "content": "{\"test_code\": \"x\"}"}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_text_response(ok).unwrap(), r#"{"test_code": "x"}"#);

        let empty: ChatCompletionResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert_eq!(extract_text_response(empty), Err(ModelError::EmptyResponse));

        let blank: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"content": "  "}}]}"#).unwrap();
        assert_eq!(extract_text_response(blank), Err(ModelError::EmptyResponse));
    }

    #[test]
    fn test_secret_file_takes_priority() {
        let secrets = SecretConfig {
            groq: Some(GroqConfig {
                api_key: "from-file".to_string(),
                model_name: Some("llama-3.1-8b-instant".to_string()),
            }),
        };
        let client = ChatCompletionsClient::try_from_sources(
            &ModelSettings::default(),
            Some(&secrets),
            Some("from-env".to_string()),
        )
        .unwrap();
        assert_eq!(client.api_key, "from-file");
        assert_eq!(client.model(), "llama-3.1-8b-instant");
    }

    #[test]
    fn test_env_key_used_without_secret_file() {
        let client = ChatCompletionsClient::try_from_sources(
            &ModelSettings::default(),
            Some(&SecretConfig::default()),
            Some("from-env".to_string()),
        )
        .unwrap();
        assert_eq!(client.api_key, "from-env");
        assert_eq!(client.model(), DEFAULT_MODEL_NAME);
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let err =
            ChatCompletionsClient::try_from_sources(&ModelSettings::default(), None, None)
                .unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains(ENV_API_KEY));

        let blank = ChatCompletionsClient::try_from_sources(
            &ModelSettings::default(),
            None,
            Some(String::new()),
        );
        assert!(blank.is_err());
    }

    #[test]
    fn test_debug_hides_api_key() {
        let rendered = format!("{:?}", client());
        assert!(!rendered.contains("gsk-test"));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_retryable_failure() {
        let settings = ModelSettings {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 2,
            ..ModelSettings::default()
        };
        let client = ChatCompletionsClient::from_settings(&settings, "key").unwrap();

        let err = client.complete("hello").await.unwrap_err();
        assert!(
            matches!(err, ModelError::Transport(_) | ModelError::Timeout(_)),
            "unexpected error: {err:?}"
        );
        assert!(err.is_retryable());
    }
}

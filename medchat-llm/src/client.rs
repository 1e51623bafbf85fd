//! Model client: a single chat-completion call against an OpenAI-compatible API.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use medchat_core::config::LlmConfig;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::LlmError;
use crate::types::{LlmRequest, LlmResponse};

/// Longest slice of an error body kept in [`LlmError::HttpStatus`].
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Provider backend for model inference.
#[derive(Debug, Clone)]
pub enum LlmProvider {
    /// OpenAI-compatible API. `base_url` includes the version segment.
    OpenAiCompatible { base_url: String, api_key: String },
    /// No credential configured; every call fails with `Unavailable`.
    None,
}

impl LlmProvider {
    /// Pick the provider for a configuration: no API key means `None`.
    #[must_use]
    pub fn from_config(config: &LlmConfig) -> Self {
        if config.api_key.trim().is_empty() {
            warn!("llm.api_key is empty; model calls will fail");
            Self::None
        } else {
            Self::OpenAiCompatible {
                base_url: config.base_url.trim_end_matches('/').to_string(),
                api_key: config.api_key.clone(),
            }
        }
    }
}

/// Anything that can turn an [`LlmRequest`] into generated text.
///
/// Handlers hold an `Arc<dyn ChatModel>`; tests swap in canned models.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Run one completion.
    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError>;

    /// Convenience: prompt in, text out, optional model override.
    async fn generate_text(&self, prompt: &str, model: Option<&str>) -> Result<String, LlmError> {
        let mut request = LlmRequest::new(prompt);
        request.model = model.map(str::to_string);
        self.generate(&request).await.map(|r| r.text)
    }
}

/// HTTP client for the configured provider.
pub struct LlmClient {
    provider: LlmProvider,
    http: Client,
    model: String,
    timeout_ms: u64,
    max_retries: u32,
}

impl std::fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let provider = match &self.provider {
            LlmProvider::OpenAiCompatible { base_url, .. } => base_url.as_str(),
            LlmProvider::None => "none",
        };
        f.debug_struct("LlmClient")
            .field("provider", &provider)
            .field("model", &self.model)
            .field("timeout_ms", &self.timeout_ms)
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

impl LlmClient {
    /// Create a client.
    #[must_use]
    pub fn new(provider: LlmProvider, model: impl Into<String>, timeout_ms: u64, max_retries: u32) -> Self {
        Self {
            provider,
            http: Client::new(),
            model: model.into(),
            timeout_ms,
            max_retries,
        }
    }

    /// Create a client from configuration read at startup.
    #[must_use]
    pub fn from_config(config: &LlmConfig) -> Self {
        Self::new(
            LlmProvider::from_config(config),
            config.model.clone(),
            config.request_timeout_ms,
            config.max_retries,
        )
    }

    /// Create a client with no backend (all calls fail).
    #[must_use]
    pub fn none() -> Self {
        Self::new(LlmProvider::None, String::new(), crate::types::DEFAULT_TIMEOUT_MS, 0)
    }

    /// Whether a backend is configured.
    #[must_use]
    pub fn is_available(&self) -> bool {
        !matches!(self.provider, LlmProvider::None)
    }

    /// Generate a completion for one prompt.
    ///
    /// The request timeout is the smaller of the request's and the client's.
    ///
    /// # Errors
    /// Any network failure, non-2xx status, malformed body or empty content.
    pub async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        match &self.provider {
            LlmProvider::None => Err(LlmError::Unavailable("No LLM provider configured".into())),
            LlmProvider::OpenAiCompatible { base_url, api_key } => {
                self.generate_openai(base_url, api_key, request).await
            }
        }
    }

    fn request_body(&self, request: &LlmRequest) -> (String, Value) {
        let model = request.model.clone().unwrap_or_else(|| self.model.clone());
        let mut body = json!({
            "model": model,
            "messages": [
                { "role": "user", "content": request.prompt },
            ],
        });
        if let Some(temperature) = request.temperature {
            body["temperature"] = json!(temperature);
        }
        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        (model, body)
    }

    async fn generate_openai(
        &self,
        base_url: &str,
        api_key: &str,
        request: &LlmRequest,
    ) -> Result<LlmResponse, LlmError> {
        let url = format!("{base_url}/chat/completions");
        let (model, body) = self.request_body(request);
        let timeout_ms = request.timeout_ms.min(self.timeout_ms);

        let mut last_error = LlmError::Unavailable("no attempt made".into());
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                debug!("Retrying LLM call (attempt {}/{})", attempt + 1, self.max_retries + 1);
            }

            let start = Instant::now();
            let result = self
                .http
                .post(&url)
                .bearer_auth(api_key)
                .json(&body)
                .timeout(Duration::from_millis(timeout_ms))
                .send()
                .await;

            let outcome = match result {
                Ok(resp) => Self::read_completion(resp, &model, start).await,
                Err(e) if e.is_timeout() => Err(LlmError::Timeout(timeout_ms)),
                Err(e) => Err(e.into()),
            };

            match outcome {
                Ok(response) => {
                    debug!(
                        model = %response.model,
                        latency_ms = response.latency_ms,
                        tokens = response.tokens_generated,
                        "LLM call succeeded"
                    );
                    return Ok(response);
                }
                Err(e) => {
                    warn!(attempt = attempt + 1, error = %e, "LLM call failed");
                    last_error = e;
                }
            }
        }

        if self.max_retries == 0 {
            Err(last_error)
        } else {
            Err(LlmError::RetriesExhausted {
                attempts: self.max_retries + 1,
                last_error: last_error.to_string(),
            })
        }
    }

    async fn read_completion(
        resp: reqwest::Response,
        model: &str,
        start: Instant,
    ) -> Result<LlmResponse, LlmError> {
        let status = resp.status();
        if !status.is_success() {
            let body: String = resp
                .text()
                .await
                .unwrap_or_default()
                .chars()
                .take(MAX_ERROR_BODY_CHARS)
                .collect();
            return Err(LlmError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let json: Value = resp
            .json()
            .await
            .map_err(|e| LlmError::ParseError(e.to_string()))?;

        let text = json["choices"][0]["message"]["content"]
            .as_str()
            .filter(|t| !t.trim().is_empty())
            .ok_or(LlmError::EmptyResponse)?
            .to_string();

        let tokens = u32::try_from(json["usage"]["completion_tokens"].as_u64().unwrap_or(0))
            .unwrap_or(u32::MAX);

        Ok(LlmResponse {
            text,
            tokens_generated: tokens,
            latency_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            model: json["model"].as_str().unwrap_or(model).to_string(),
        })
    }
}

#[async_trait]
impl ChatModel for LlmClient {
    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        LlmClient::generate(self, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn none_provider_is_unavailable() {
        let client = LlmClient::none();
        assert!(!client.is_available());
        let err = client.generate(&LlmRequest::new("hi")).await.expect_err("no provider");
        assert!(matches!(err, LlmError::Unavailable(_)));
    }

    #[test]
    fn empty_api_key_selects_none() {
        let config = LlmConfig::default();
        assert!(matches!(LlmProvider::from_config(&config), LlmProvider::None));

        let config = LlmConfig {
            api_key: "sk-test".into(),
            base_url: "https://llm.example/v1/".into(),
            ..LlmConfig::default()
        };
        match LlmProvider::from_config(&config) {
            LlmProvider::OpenAiCompatible { base_url, .. } => {
                assert_eq!(base_url, "https://llm.example/v1");
            }
            LlmProvider::None => panic!("expected OpenAI provider"),
        }
    }

    #[test]
    fn body_has_single_user_message_and_omits_unset_sampling() {
        let client = LlmClient::new(LlmProvider::None, "gpt-4o", 30_000, 0);
        let (model, body) = client.request_body(&LlmRequest::new("阿司匹林"));

        assert_eq!(model, "gpt-4o");
        assert_eq!(body["messages"].as_array().map(Vec::len), Some(1));
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "阿司匹林");
        assert!(body.get("temperature").is_none());
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn body_carries_model_override_and_sampling() {
        let client = LlmClient::new(LlmProvider::None, "gpt-4o", 30_000, 0);
        let request = LlmRequest::new("x")
            .with_model("gpt-4o-mini")
            .with_sampling(Some(0.5), Some(2000));
        let (model, body) = client.request_body(&request);

        assert_eq!(model, "gpt-4o-mini");
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["temperature"], json!(0.5));
        assert_eq!(body["max_tokens"], 2000);
    }
}

//! Core types for model requests and responses.

use serde::{Deserialize, Serialize};

/// Default per-call timeout when the caller does not set one.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// A request to the model: one composed prompt plus optional sampling knobs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LlmRequest {
    /// The composed prompt, sent as the only `user` message.
    pub prompt: String,
    /// Model override; `None` uses the client's configured model.
    pub model: Option<String>,
    /// Sampling temperature; omitted from the wire when `None`.
    pub temperature: Option<f64>,
    /// Completion token cap; omitted from the wire when `None`.
    pub max_tokens: Option<u32>,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl LlmRequest {
    /// Create a request for `prompt` with provider defaults.
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: None,
            temperature: None,
            max_tokens: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    /// Use a specific model for this request.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set temperature and token cap (either may be `None`).
    #[must_use]
    pub fn with_sampling(mut self, temperature: Option<f64>, max_tokens: Option<u32>) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    /// Set the timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}

/// A response from the model.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LlmResponse {
    /// The generated text of the first choice.
    pub text: String,
    /// Completion tokens reported by the API (0 if absent).
    pub tokens_generated: u32,
    /// Latency in milliseconds.
    pub latency_ms: u64,
    /// Which model was used.
    pub model: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_fields() {
        let req = LlmRequest::new("hi")
            .with_model("gpt-4o-mini")
            .with_sampling(Some(0.7), Some(2000))
            .with_timeout(5_000);
        assert_eq!(req.prompt, "hi");
        assert_eq!(req.model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(req.temperature, Some(0.7));
        assert_eq!(req.max_tokens, Some(2000));
        assert_eq!(req.timeout_ms, 5_000);
    }

    #[test]
    fn defaults_leave_sampling_unset() {
        let req = LlmRequest::new("hi");
        assert!(req.model.is_none());
        assert!(req.temperature.is_none());
        assert_eq!(req.timeout_ms, DEFAULT_TIMEOUT_MS);
    }
}

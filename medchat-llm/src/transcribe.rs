//! Speech-to-text behind a narrow trait.
//!
//! The clinic service stages each upload on disk and hands its path to a
//! [`Transcriber`], which gives text back. [`OpenAiTranscriber`] calls `/audio/transcriptions` on the same
//! OpenAI-compatible upstream the chat client uses.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use medchat_core::config::LlmConfig;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::error::LlmError;

/// One staged audio file.
#[derive(Debug, Clone)]
pub struct AudioInput {
    /// Where the upload was written.
    pub path: PathBuf,
    /// Client-supplied file name (used for the upstream's format sniffing).
    pub file_name: String,
    /// MIME type, if the client sent one.
    pub content_type: Option<String>,
}

/// Turns audio into text.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe the file at `audio.path`.
    async fn transcribe(&self, audio: &AudioInput) -> Result<String, LlmError>;
}

/// Remote transcription through an OpenAI-compatible API.
pub struct OpenAiTranscriber {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
    timeout_ms: u64,
}

impl std::fmt::Debug for OpenAiTranscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiTranscriber")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl OpenAiTranscriber {
    /// Create a transcriber.
    #[must_use]
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout_ms: u64,
    ) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            timeout_ms,
        }
    }

    /// Create from the shared LLM configuration.
    #[must_use]
    pub fn from_config(config: &LlmConfig) -> Self {
        Self::new(
            config.base_url.clone(),
            config.api_key.clone(),
            config.transcription_model.clone(),
            config.request_timeout_ms,
        )
    }
}

#[async_trait]
impl Transcriber for OpenAiTranscriber {
    async fn transcribe(&self, audio: &AudioInput) -> Result<String, LlmError> {
        if self.api_key.trim().is_empty() {
            return Err(LlmError::Unavailable("No transcription provider configured".into()));
        }

        let bytes = tokio::fs::read(&audio.path).await.map_err(|e| {
            LlmError::RequestFailed(format!("cannot read {}: {e}", audio.path.display()))
        })?;
        let size = bytes.len();
        let mut part = Part::bytes(bytes).file_name(audio.file_name.clone());
        if let Some(ct) = audio.content_type.as_deref() {
            part = part
                .mime_str(ct)
                .map_err(|e| LlmError::RequestFailed(format!("bad content type {ct}: {e}")))?;
        }
        let form = Form::new().text("model", self.model.clone()).part("file", part);

        let resp = self
            .http
            .post(format!("{}/audio/transcriptions", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .timeout(Duration::from_millis(self.timeout_ms))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(self.timeout_ms)
                } else {
                    e.into()
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::HttpStatus {
                status: status.as_u16(),
                body: body.chars().take(512).collect(),
            });
        }

        let json: Value = resp
            .json()
            .await
            .map_err(|e| LlmError::ParseError(e.to_string()))?;
        let text = json["text"]
            .as_str()
            .ok_or_else(|| LlmError::ParseError("missing `text` field".into()))?
            .trim()
            .to_string();

        debug!(bytes = size, chars = text.chars().count(), "Transcription complete");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_key_is_unavailable() {
        let t = OpenAiTranscriber::new("http://localhost:1", "", "whisper-1", 1_000);
        let err = t
            .transcribe(&AudioInput {
                path: PathBuf::from("a.wav"),
                file_name: "a.wav".into(),
                content_type: None,
            })
            .await
            .expect_err("no key");
        assert!(matches!(err, LlmError::Unavailable(_)));
    }

    #[tokio::test]
    async fn missing_staged_file_fails_before_sending() {
        let dir = tempfile::tempdir().expect("tempdir");
        let t = OpenAiTranscriber::new("http://localhost:1", "sk-test", "whisper-1", 1_000);
        let err = t
            .transcribe(&AudioInput {
                path: dir.path().join("gone.m4a"),
                file_name: "gone.m4a".into(),
                content_type: None,
            })
            .await
            .expect_err("no file");
        assert!(matches!(err, LlmError::RequestFailed(ref m) if m.contains("gone.m4a")), "{err:?}");
    }

    #[test]
    fn from_config_trims_base_url() {
        let config = LlmConfig {
            base_url: "https://llm.example/v1/".into(),
            ..LlmConfig::default()
        };
        let t = OpenAiTranscriber::from_config(&config);
        assert_eq!(t.base_url, "https://llm.example/v1");
        assert_eq!(t.model, "whisper-1");
    }
}

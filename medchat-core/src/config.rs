//! Configuration for the MEDCHAT services.
//!
//! Read once at process start from an optional `medchat.toml` plus
//! `MEDCHAT__SECTION__KEY` environment overrides, then passed by value into
//! the model client, the HTTP layer and the account store. Credentials are
//! never compiled in: `llm.api_key` and `auth.token_secret` default to empty.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MedchatError, Result};
use crate::types::UpstreamPolicy;

/// Environment prefix for overrides (`MEDCHAT__LLM__API_KEY`, ...).
pub const ENV_PREFIX: &str = "MEDCHAT";

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MedchatConfig {
    /// Logging settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Upstream model settings.
    #[serde(default)]
    pub llm: LlmConfig,
    /// Listening address and per-service overrides.
    #[serde(default)]
    pub server: ServerConfig,
    /// Token signing.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Database and upload paths.
    #[serde(default)]
    pub storage: StorageConfig,
    /// News scraper defaults.
    #[serde(default)]
    pub scraper: ScraperConfig,
    /// Persona table overrides, merged over the built-in tables.
    #[serde(default)]
    pub personas: PersonaConfig,
}

impl MedchatConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `MedchatError::Config` if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| MedchatError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Layered load: the optional TOML file, then environment overrides.
    ///
    /// `MEDCHAT__LLM__API_KEY=sk-...` sets `llm.api_key`,
    /// `MEDCHAT__SERVER__CLINIC__PORT=8080` sets `server.clinic.port`.
    ///
    /// # Errors
    /// Returns `MedchatError::Config` if a source is unreadable or a value has
    /// the wrong type.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path.to_path_buf()).required(true));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        builder
            .build()
            .and_then(|c| c.try_deserialize::<Self>())
            .map_err(|e| MedchatError::Config(e.to_string()))
    }

    /// Check values that would otherwise fail on the first request.
    ///
    /// # Errors
    /// Returns `MedchatError::Config` describing the first bad value.
    pub fn validate(&self) -> Result<()> {
        if self.llm.model.trim().is_empty() {
            return Err(MedchatError::Config("llm.model must not be empty".into()));
        }
        if self.llm.base_url.trim().is_empty() {
            return Err(MedchatError::Config("llm.base_url must not be empty".into()));
        }
        if self.llm.request_timeout_ms == 0 {
            return Err(MedchatError::Config(
                "llm.request_timeout_ms must be greater than zero".into(),
            ));
        }
        if self.auth.token_ttl_hours == 0 {
            return Err(MedchatError::Config(
                "auth.token_ttl_hours must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default filter when `RUST_LOG` is unset: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Output format: "pretty" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

/// Upstream chat-completion API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL including the version segment, e.g. `https://api.openai.com/v1`.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Bearer credential. Empty means no provider: every call fails.
    #[serde(default)]
    pub api_key: String,
    /// Model identifier for chat completions.
    #[serde(default = "default_model")]
    pub model: String,
    /// Model identifier for audio transcription.
    #[serde(default = "default_transcription_model")]
    pub transcription_model: String,
    /// Hard timeout for one upstream call in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Extra attempts after a failed call. Zero keeps the single-call behavior.
    #[serde(default)]
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            model: default_model(),
            transcription_model: default_transcription_model(),
            request_timeout_ms: default_timeout_ms(),
            max_retries: 0,
        }
    }
}

/// Listening host plus one override block per service family.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Multi-persona advisor service.
    #[serde(default)]
    pub advisor: ServiceOverrides,
    /// Blood-pressure evaluation service.
    #[serde(default)]
    pub health: ServiceOverrides,
    /// Medication usage / frequency service.
    #[serde(default)]
    pub dosage: ServiceOverrides,
    /// Condition, medicine, psychology, audio and account service.
    #[serde(default)]
    pub clinic: ServiceOverrides,
    /// Maximum accepted request body in bytes (audio uploads included).
    #[serde(default = "default_body_limit")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            advisor: ServiceOverrides::default(),
            health: ServiceOverrides::default(),
            dosage: ServiceOverrides::default(),
            clinic: ServiceOverrides::default(),
            max_body_bytes: default_body_limit(),
        }
    }
}

/// Optional per-service settings; unset values use the family default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceOverrides {
    /// Listening port.
    #[serde(default)]
    pub port: Option<u16>,
    /// Upstream failure policy.
    #[serde(default)]
    pub policy: Option<UpstreamPolicy>,
    /// Sampling temperature sent upstream.
    #[serde(default)]
    pub temperature: Option<f64>,
    /// Completion token cap sent upstream.
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

/// Token signing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for HS256 tokens. Required by the clinic service.
    #[serde(default)]
    pub token_secret: String,
    /// Token lifetime in hours.
    #[serde(default = "default_ttl_hours")]
    pub token_ttl_hours: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: String::new(),
            token_ttl_hours: default_ttl_hours(),
        }
    }
}

/// Paths for persistent and temporary data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite database holding user accounts.
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    /// Directory where uploaded audio is staged before transcription.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    /// Use WAL journal mode.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            upload_dir: default_upload_dir(),
            wal_mode: true,
        }
    }
}

/// News scraper defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// Page to scrape when no URL is given.
    #[serde(default = "default_scrape_url")]
    pub url: String,
    /// CSS selector matching the headline anchors.
    #[serde(default = "default_scrape_selector")]
    pub selector: String,
    /// Fetch timeout in milliseconds.
    #[serde(default = "default_scrape_timeout_ms")]
    pub request_timeout_ms: u64,
    /// User-Agent header sent with the fetch.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            url: default_scrape_url(),
            selector: default_scrape_selector(),
            request_timeout_ms: default_scrape_timeout_ms(),
            user_agent: default_user_agent(),
        }
    }
}

/// Category → instruction entries merged over the built-in persona tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersonaConfig {
    /// Overrides for the advisor `/chat` table.
    #[serde(default)]
    pub advisor: BTreeMap<String, String>,
    /// Overrides for the dosage `/chat` table.
    #[serde(default)]
    pub dosage: BTreeMap<String, String>,
}

// ---------------------------------------------------------------------------
// Default value functions (serde requires named functions)
// ---------------------------------------------------------------------------

fn default_true() -> bool {
    true
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "pretty".to_string()
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_model() -> String {
    "gpt-4o".to_string()
}
fn default_transcription_model() -> String {
    "whisper-1".to_string()
}
fn default_timeout_ms() -> u64 {
    30_000
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_body_limit() -> usize {
    25 * 1024 * 1024
}
fn default_ttl_hours() -> u32 {
    24
}
fn default_database_path() -> PathBuf {
    PathBuf::from("medical_app.db")
}
fn default_upload_dir() -> PathBuf {
    PathBuf::from("audio_uploads")
}
fn default_scrape_url() -> String {
    "https://www.dxy.cn/".to_string()
}
fn default_scrape_selector() -> String {
    "div.ArticleList_articleList__3BrcS a".to_string()
}
fn default_scrape_timeout_ms() -> u64 {
    15_000
}
fn default_user_agent() -> String {
    concat!("medchat/", env!("CARGO_PKG_VERSION")).to_string()
}

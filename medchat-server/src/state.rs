//! Shared per-process state handed to every handler.

use std::path::PathBuf;
use std::sync::Arc;

use medchat_core::config::LlmConfig;
use medchat_core::{AccountStore, MedchatConfig, MedchatError, TokenSigner};
use medchat_llm::types::DEFAULT_TIMEOUT_MS;
use medchat_llm::{ChatModel, LlmClient, LlmRequest, OpenAiTranscriber, PersonaTable, Transcriber};
use parking_lot::Mutex;
use tracing::info;

use crate::error::ApiError;
use crate::service::{ServiceKind, ServiceSettings};

/// Account store plus the signer for its tokens.
#[derive(Clone)]
pub struct Accounts {
    pub store: Arc<Mutex<AccountStore>>,
    pub signer: Arc<TokenSigner>,
}

/// Everything a handler needs. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub settings: ServiceSettings,
    pub personas: Arc<PersonaTable>,
    pub model: Arc<dyn ChatModel>,
    pub transcriber: Arc<dyn Transcriber>,
    pub accounts: Option<Accounts>,
    pub upload_dir: PathBuf,
    pub llm_timeout_ms: u64,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("settings", &self.settings)
            .field("personas", &self.personas.len())
            .field("accounts", &self.accounts.is_some())
            .field("upload_dir", &self.upload_dir)
            .finish_non_exhaustive()
    }
}

/// Built-in persona table for a family; families without `/chat` personas get
/// an empty one.
fn builtin_personas(kind: ServiceKind) -> PersonaTable {
    match kind {
        ServiceKind::Advisor => PersonaTable::advisor(),
        ServiceKind::Dosage => PersonaTable::dosage(),
        ServiceKind::Health | ServiceKind::Clinic => PersonaTable::default(),
    }
}

impl AppState {
    /// State with family defaults and the given model. No account store; the
    /// transcriber is unconfigured until [`AppState::with_transcriber`].
    pub fn new(settings: ServiceSettings, model: Arc<dyn ChatModel>) -> Self {
        let kind = settings.kind;
        Self {
            settings,
            personas: Arc::new(builtin_personas(kind)),
            model,
            transcriber: Arc::new(OpenAiTranscriber::from_config(&LlmConfig::default())),
            accounts: None,
            upload_dir: std::env::temp_dir(),
            llm_timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    #[must_use]
    pub fn with_personas(mut self, personas: PersonaTable) -> Self {
        self.personas = Arc::new(personas);
        self
    }

    #[must_use]
    pub fn with_transcriber(mut self, transcriber: Arc<dyn Transcriber>) -> Self {
        self.transcriber = transcriber;
        self
    }

    #[must_use]
    pub fn with_accounts(mut self, store: AccountStore, signer: TokenSigner) -> Self {
        self.accounts = Some(Accounts {
            store: Arc::new(Mutex::new(store)),
            signer: Arc::new(signer),
        });
        self
    }

    #[must_use]
    pub fn with_upload_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.upload_dir = dir.into();
        self
    }

    /// Build the real state for `kind`: HTTP model client, persona overrides,
    /// and for the clinic family the account store, signer and upload dir.
    ///
    /// # Errors
    /// Fails if the clinic store cannot be opened, the upload directory cannot
    /// be created, or no token secret is configured.
    pub fn from_config(kind: ServiceKind, config: &MedchatConfig) -> Result<Self, MedchatError> {
        let settings = ServiceSettings::resolve(kind, &config.server);
        let personas = match kind {
            ServiceKind::Advisor => PersonaTable::advisor().with_overrides(&config.personas.advisor),
            ServiceKind::Dosage => PersonaTable::dosage().with_overrides(&config.personas.dosage),
            other => builtin_personas(other),
        };

        let mut state = Self::new(settings, Arc::new(LlmClient::from_config(&config.llm)))
            .with_personas(personas)
            .with_transcriber(Arc::new(OpenAiTranscriber::from_config(&config.llm)))
            .with_upload_dir(config.storage.upload_dir.clone());
        state.llm_timeout_ms = config.llm.request_timeout_ms;

        if kind == ServiceKind::Clinic {
            std::fs::create_dir_all(&config.storage.upload_dir)?;
            let store = AccountStore::open(&config.storage.database_path, config.storage.wal_mode)?;
            let signer = TokenSigner::new(
                config.auth.token_secret.clone(),
                config.auth.token_ttl_hours,
            )?;
            info!(
                db = %config.storage.database_path.display(),
                uploads = %config.storage.upload_dir.display(),
                "Clinic storage ready"
            );
            state = state.with_accounts(store, signer);
        }

        Ok(state)
    }

    /// Model request for `prompt` with this family's sampling and timeout.
    #[must_use]
    pub fn request(&self, prompt: impl Into<String>) -> LlmRequest {
        LlmRequest::new(prompt)
            .with_sampling(self.settings.temperature, self.settings.max_tokens)
            .with_timeout(self.llm_timeout_ms)
    }

    /// The account store, or a 500 if this service has none.
    pub fn accounts(&self) -> Result<&Accounts, ApiError> {
        self.accounts
            .as_ref()
            .ok_or_else(|| ApiError::Internal("Account store not configured".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clinic_requires_token_secret() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = MedchatConfig::default();
        config.storage.database_path = dir.path().join("accounts.db");
        config.storage.upload_dir = dir.path().join("uploads");

        let err = AppState::from_config(ServiceKind::Clinic, &config).expect_err("no secret");
        assert!(matches!(err, MedchatError::Config(_)), "{err:?}");
    }

    #[test]
    fn clinic_opens_store_and_upload_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = MedchatConfig::default();
        config.auth.token_secret = "s".into();
        config.storage.database_path = dir.path().join("accounts.db");
        config.storage.upload_dir = dir.path().join("uploads");

        let state = AppState::from_config(ServiceKind::Clinic, &config).expect("state");
        assert!(state.accounts.is_some());
        assert!(config.storage.upload_dir.is_dir());
        assert_eq!(state.request("x").max_tokens, Some(2000));
    }

    #[test]
    fn persona_overrides_apply_to_their_family_only() {
        let config = MedchatConfig::from_toml(
            r#"
            [personas.advisor]
            diet = "营养师："
            "#,
        )
        .expect("config");

        let advisor = AppState::from_config(ServiceKind::Advisor, &config).expect("advisor");
        assert_eq!(advisor.personas.compose(Some("diet"), "x"), "营养师：x");
        assert!(advisor.accounts.is_none());

        let dosage = AppState::from_config(ServiceKind::Dosage, &config).expect("dosage");
        assert_eq!(dosage.personas.compose(Some("diet"), "x"), "x");
    }
}

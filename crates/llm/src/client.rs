//! Shared model client.
//!
//! The provider is built on first use from a credential read out of the
//! process environment. A missing credential surfaces as a configuration
//! error from `complete`, never at construction time.

use crate::providers::groq_provider::{GROQ_DEFAULT_ENDPOINT, GROQ_DEFAULT_MODEL};
use crate::providers::{GroqProvider, LlmProvider, LlmRequest};
use async_trait::async_trait;
use common::{ConfigError, ConfigResult, LLMError, LLMResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Single text-in, text-out call point used by the docstring generator
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> LLMResult<String>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSettings {
    /// Environment variable holding the API key
    pub api_key_env: String,
    pub model: String,
    pub endpoint: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub timeout: Duration,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            api_key_env: "GROQ_API_KEY".to_string(),
            model: GROQ_DEFAULT_MODEL.to_string(),
            endpoint: GROQ_DEFAULT_ENDPOINT.to_string(),
            temperature: 0.3,
            max_tokens: Some(1024),
            timeout: Duration::from_secs(30),
        }
    }
}

impl ModelSettings {
    /// Defaults overridden by `GROQ_MODEL`, `GROQ_BASE_URL`,
    /// `DOCSMITH_TEMPERATURE` and `DOCSMITH_TIMEOUT_SECS`.
    pub fn from_env() -> ConfigResult<Self> {
        dotenv::dotenv().ok();

        let mut settings = Self::default();

        if let Ok(model) = env::var("GROQ_MODEL") {
            if !model.trim().is_empty() {
                settings.model = model;
            }
        }

        if let Ok(endpoint) = env::var("GROQ_BASE_URL") {
            if !endpoint.trim().is_empty() {
                settings.endpoint = endpoint;
            }
        }

        if let Ok(raw) = env::var("DOCSMITH_TEMPERATURE") {
            settings.temperature = raw.parse::<f32>().map_err(|e| ConfigError::InvalidValue {
                config_key: "DOCSMITH_TEMPERATURE".to_string(),
                value: raw.clone(),
                reason: e.to_string(),
            })?;
        }

        if let Ok(raw) = env::var("DOCSMITH_TIMEOUT_SECS") {
            let secs = raw.parse::<u64>().map_err(|e| ConfigError::InvalidValue {
                config_key: "DOCSMITH_TIMEOUT_SECS".to_string(),
                value: raw.clone(),
                reason: e.to_string(),
            })?;
            settings.timeout = Duration::from_secs(secs);
        }

        Ok(settings)
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_api_key_env(mut self, var_name: impl Into<String>) -> Self {
        self.api_key_env = var_name.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn resolve_api_key(&self) -> ConfigResult<String> {
        match env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            Ok(_) | Err(env::VarError::NotPresent) => Err(ConfigError::MissingRequired {
                config_key: self.api_key_env.clone(),
            }),
            Err(e) => Err(ConfigError::EnvVarError {
                var_name: self.api_key_env.clone(),
                reason: e.to_string(),
            }),
        }
    }
}

/// Lazily initialised, shared model client.
///
/// Cloning shares the same provider cell.
#[derive(Clone)]
pub struct ModelClient {
    settings: ModelSettings,
    provider: Arc<OnceCell<Arc<dyn LlmProvider>>>,
}

impl ModelClient {
    pub fn new(settings: ModelSettings) -> Self {
        Self {
            settings,
            provider: Arc::new(OnceCell::new()),
        }
    }

    pub fn from_env() -> ConfigResult<Self> {
        Ok(Self::new(ModelSettings::from_env()?))
    }

    /// Client backed by an already constructed provider.
    pub fn with_provider(settings: ModelSettings, provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            settings,
            provider: Arc::new(OnceCell::new_with(Some(provider))),
        }
    }

    pub fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    pub fn is_initialized(&self) -> bool {
        self.provider.initialized()
    }

    async fn provider(&self) -> LLMResult<&Arc<dyn LlmProvider>> {
        self.provider
            .get_or_try_init(|| async {
                let api_key = self.settings.resolve_api_key()?;
                let provider = GroqProvider::with_timeout(
                    api_key,
                    self.settings.model.clone(),
                    Some(self.settings.endpoint.clone()),
                    self.settings.timeout,
                )
                .map_err(|e| ConfigError::InvalidValue {
                    config_key: "endpoint".to_string(),
                    value: self.settings.endpoint.clone(),
                    reason: e.to_string(),
                })?;

                info!("Initialized model client: {}", provider.name());
                Ok::<Arc<dyn LlmProvider>, LLMError>(Arc::new(provider))
            })
            .await
    }
}

#[async_trait]
impl CompletionClient for ModelClient {
    async fn complete(&self, prompt: &str) -> LLMResult<String> {
        let provider = self.provider().await?;

        let request = LlmRequest::new(prompt).with_parameters(
            self.settings.max_tokens,
            Some(self.settings.temperature),
        );

        debug!("Model prompt ({} chars)", prompt.len());

        let response = provider
            .complete(request)
            .await
            .map_err(|e| classify_provider_error(&provider.id().provider_type, e))?;

        Ok(response.content)
    }
}

/// Keep typed provider errors, wrap everything else as transport failure.
fn classify_provider_error(provider: &str, error: anyhow::Error) -> LLMError {
    match error.downcast::<LLMError>() {
        Ok(typed) => typed,
        Err(other) => LLMError::Transport {
            provider: provider.to_string(),
            reason: other.to_string(),
        },
    }
}

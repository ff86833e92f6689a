use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub mod groq_provider;

pub use groq_provider::GroqProvider;

/// One single-turn completion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmRequest {
    pub prompt: String,
    pub system_prompt: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl LlmRequest {
    pub fn new(prompt: &str) -> Self {
        Self {
            prompt: prompt.to_string(),
            system_prompt: None,
            max_tokens: None,
            temperature: None,
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: &str) -> Self {
        self.system_prompt = Some(system_prompt.to_string());
        self
    }

    pub fn with_parameters(mut self, max_tokens: Option<u32>, temperature: Option<f32>) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }
}

/// Completion text plus the bookkeeping the provider reports
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub content: String,
    pub usage: TokenUsage,
    pub model: String,
    pub finish_reason: String,
    pub response_time: Duration,
}

/// Token usage statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }
}

/// Provider identification
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderId {
    pub provider_type: String,
    pub model: String,
}

impl ProviderId {
    pub fn new(provider_type: &str, model: &str) -> Self {
        Self {
            provider_type: provider_type.to_string(),
            model: model.to_string(),
        }
    }
}

/// A text-generation backend reachable with one request/response round-trip.
///
/// Implementations report failures as `anyhow::Error`; typed `LLMError`s
/// wrapped inside survive the trip to `ModelClient`.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Unique identifier for this provider instance
    fn id(&self) -> ProviderId;

    /// Execute completion request
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse>;

    /// Reject requests no backend should receive
    fn validate_request(&self, request: &LlmRequest) -> Result<()> {
        if request.prompt.trim().is_empty() {
            return Err(anyhow::anyhow!("Prompt cannot be empty"));
        }

        if let Some(temperature) = request.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(anyhow::anyhow!(
                    "Temperature {} is outside the supported range 0.0..=2.0",
                    temperature
                ));
            }
        }

        Ok(())
    }

    /// Get human-readable name
    fn name(&self) -> String {
        format!("{} ({})", self.id().provider_type, self.id().model)
    }
}

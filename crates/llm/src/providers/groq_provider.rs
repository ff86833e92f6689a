use super::{LlmProvider, LlmRequest, LlmResponse, ProviderId, TokenUsage};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use common::LLMError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, error};

pub const GROQ_DEFAULT_ENDPOINT: &str = "https://api.groq.com/openai/v1";
pub const GROQ_DEFAULT_MODEL: &str = "llama-3.1-8b-instant";

#[derive(Debug, Clone)]
pub struct GroqProvider {
    api_key: String,
    model: String,
    endpoint: String,
    client: Client,
}

impl GroqProvider {
    pub fn new(api_key: String, model: String, endpoint: Option<String>) -> Result<Self> {
        Self::with_timeout(api_key, model, endpoint, Duration::from_secs(30))
    }

    pub fn with_timeout(
        api_key: String,
        model: String,
        endpoint: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        if api_key.is_empty() {
            return Err(anyhow!("Groq API key cannot be empty"));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow!("Failed to create HTTP client: {}", e))?;

        let endpoint = endpoint
            .unwrap_or_else(|| GROQ_DEFAULT_ENDPOINT.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            api_key,
            model,
            endpoint,
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl LlmProvider for GroqProvider {
    fn id(&self) -> ProviderId {
        ProviderId::new("groq", &self.model)
    }

    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        let start_time = Instant::now();

        self.validate_request(&request)?;

        let mut messages = Vec::new();

        if let Some(system_prompt) = &request.system_prompt {
            messages.push(GroqMessage {
                role: "system".to_string(),
                content: system_prompt.clone(),
            });
        }

        messages.push(GroqMessage {
            role: "user".to_string(),
            content: request.prompt.clone(),
        });

        let groq_request = GroqRequest {
            model: self.model.clone(),
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        debug!(
            "Sending request to Groq: {} (model: {})",
            request.prompt.chars().take(50).collect::<String>(),
            self.model
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.endpoint))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&groq_request)
            .send()
            .await
            .map_err(|e| LLMError::Transport {
                provider: "groq".to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Groq API error ({}): {}", status, error_text);
            return Err(LLMError::APIRequest {
                provider: "groq".to_string(),
                status_code: status.as_u16(),
                body: error_text,
            }
            .into());
        }

        let groq_response: GroqResponse =
            response
                .json()
                .await
                .map_err(|e| LLMError::ResponseParsing {
                    reason: e.to_string(),
                })?;
        let elapsed = start_time.elapsed();

        let choice = groq_response
            .choices
            .first()
            .ok_or_else(|| LLMError::EmptyResponse {
                provider: "groq".to_string(),
            })?;

        let content = choice.message.content.clone().unwrap_or_default();

        let usage = if let Some(usage) = groq_response.usage {
            TokenUsage::new(usage.prompt_tokens, usage.completion_tokens)
        } else {
            let prompt_tokens = request.prompt.len() as u32 / 4;
            let completion_tokens = content.len() as u32 / 4;
            TokenUsage::new(prompt_tokens, completion_tokens)
        };

        debug!(
            "Received response from Groq ({:?}): {} tokens",
            elapsed, usage.total_tokens
        );

        Ok(LlmResponse {
            content,
            usage,
            model: self.model.clone(),
            finish_reason: choice
                .finish_reason
                .clone()
                .unwrap_or_else(|| "stop".to_string()),
            response_time: elapsed,
        })
    }
}

#[derive(Debug, Serialize)]
struct GroqRequest {
    model: String,
    messages: Vec<GroqMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct GroqMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct GroqResponse {
    choices: Vec<GroqChoice>,
    usage: Option<GroqUsage>,
}

#[derive(Debug, Deserialize)]
struct GroqChoice {
    message: GroqResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GroqResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GroqUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

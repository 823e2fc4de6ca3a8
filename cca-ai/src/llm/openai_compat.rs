//! OpenAI-compatible chat completion client
//!
//! Works with any endpoint that accepts the OpenAI request format (OpenAI,
//! Azure-style gateways, local servers such as Ollama or vLLM) by changing
//! `llm.base_url`.

use super::provider::{ChatProvider, ChatRequest, ChatResponse};
use super::LlmError;
use async_trait::async_trait;
use cca_common::config::LlmConfig;
use std::time::Duration;
use tracing::{debug, warn};

const USER_AGENT: &str = concat!("cca-ai/", env!("CARGO_PKG_VERSION"));

/// Chat provider speaking the OpenAI completion API
pub struct OpenAiCompatProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenAiCompatProvider {
    pub fn new(config: &LlmConfig, api_key: String) -> Result<Self, LlmError> {
        if config.base_url.trim().is_empty() {
            return Err(LlmError::NotConfigured("llm.base_url is empty".to_string()));
        }

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            api_key,
        })
    }

    fn completions_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        format!("{base}/chat/completions")
    }
}

#[async_trait]
impl ChatProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        "openai-compat"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, LlmError> {
        debug!(
            model = %request.model,
            messages = request.messages.len(),
            "sending chat completion request"
        );

        let response = self
            .http
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return match status.as_u16() {
                401 | 403 => Err(LlmError::AuthFailed(body)),
                429 => {
                    warn!(body = %body, "rate limited");
                    Err(LlmError::RateLimited)
                }
                _ => Err(LlmError::RequestFailed(format!("HTTP {status}: {body}"))),
            };
        }

        let chat_response: ChatResponse = response.json().await.map_err(|e| {
            LlmError::InvalidResponse(format!("failed to parse response: {e}"))
        })?;

        debug!(
            model = %chat_response.model,
            choices = chat_response.choices.len(),
            "chat completion response received"
        );

        Ok(chat_response)
    }
}

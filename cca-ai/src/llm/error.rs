//! LLM client errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    /// Endpoint returned an error status
    #[error("request failed: {0}")]
    RequestFailed(String),

    /// 401/403 from the endpoint
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// 429 from the endpoint
    #[error("rate limited")]
    RateLimited,

    /// No API key or endpoint configured
    #[error("not configured: {0}")]
    NotConfigured(String),

    /// Response body was not a chat completion
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Completion content did not match the expected structure
    #[error("structured output rejected: {0}")]
    Parse(String),

    /// Transport error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

//! Structured generation over a chat provider
//!
//! Each [`ComplianceModel`] call renders a prompt, requests a JSON object at
//! temperature 0 and validates the reply against a typed schema. Anything
//! that does not parse is an [`LlmError::Parse`].

use super::provider::{ChatMessage, ChatProvider, ChatRequest, ResponseFormat};
use super::{ComplianceModel, LlmError};
use crate::models::{AnalysisVerdict, SegmentDraft};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

const SEGMENTATION_PROMPT: &str = r#"You analyze bank call-center transcripts.
Split the transcript into logical question/answer blocks in which the customer asks a question or makes a request and the agent answers it.
Keep only blocks that may fall under banking regulation (loans, interest rates, terms, card fees, debt restructuring and similar).
Skip identity verification, greetings, small talk and other irrelevant dialogue.
Reply with a JSON object of the form:
{"segments": [{"customer_query": "...", "agent_response": "..."}]}
Return {"segments": []} when nothing is relevant."#;

const QUERY_TRANSFORM_PROMPT: &str = r#"You are a banking regulation expert.
Read a call-center exchange, decide which regulation it concerns and write a formal, keyword-rich search query for a regulation document index.
Examples:
- "My statement is huge, can we split it?" -> "Credit card debt instalment or restructuring"
- "I'm borrowing 150k, what's the longest term?" -> "Consumer loan maximum term limits"
Reply with a JSON object of the form:
{"search_query": "..."}"#;

const ANALYSIS_PROMPT: &str = r#"You are a senior banking compliance auditor.
Review one segment of a call-center conversation against the regulation excerpts provided.
1. Violation: does the agent's answer clearly contradict the regulation (e.g. the regulation caps terms at 12 months and the agent offers 18)?
2. Omission: did the agent leave out critical information from the regulation that is directly relevant to the customer's question (e.g. the legal interest ceiling)?
The excerpts may be irrelevant or empty; judge only what they support.
Reply with a JSON object of the form:
{"violation_detected": bool, "omission_detected": bool, "analysis": "short explanation", "suggestion": "corrective guidance or null"}
Set "suggestion" to null when neither flag is true."#;

/// Segmentation reply
#[derive(Debug, Deserialize)]
pub struct TranscriptSegments {
    pub segments: Vec<SegmentDraft>,
}

/// Query transformation reply
#[derive(Debug, Deserialize)]
pub struct SearchQueryOutput {
    pub search_query: String,
}

/// [`ComplianceModel`] backed by a chat completion provider
pub struct StructuredLlm {
    provider: Arc<dyn ChatProvider>,
    model: String,
    temperature: f32,
}

impl StructuredLlm {
    pub fn new(provider: Arc<dyn ChatProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.0,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    async fn generate<T: DeserializeOwned>(
        &self,
        system: &str,
        user: String,
    ) -> Result<T, LlmError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            temperature: self.temperature,
            response_format: Some(ResponseFormat::json_object()),
        };

        let response = self.provider.complete(&request).await?;
        let content = response
            .first_content()
            .ok_or_else(|| LlmError::InvalidResponse("no choices in response".to_string()))?;

        debug!(
            provider = self.provider.name(),
            chars = content.len(),
            "structured reply received"
        );

        parse_structured(content)
    }
}

#[async_trait]
impl ComplianceModel for StructuredLlm {
    async fn segment(&self, transcript: &str) -> Result<Vec<SegmentDraft>, LlmError> {
        let user = format!("Transcript:\n---\n{transcript}\n---");
        let reply: TranscriptSegments = self.generate(SEGMENTATION_PROMPT, user).await?;
        Ok(reply.segments)
    }

    async fn transform_query(
        &self,
        customer_query: &str,
        agent_response: &str,
    ) -> Result<String, LlmError> {
        let user = format!("Customer: {customer_query}\nAgent: {agent_response}");
        let reply: SearchQueryOutput = self.generate(QUERY_TRANSFORM_PROMPT, user).await?;
        Ok(reply.search_query)
    }

    async fn analyze(
        &self,
        customer_query: &str,
        agent_response: &str,
        context: &str,
    ) -> Result<AnalysisVerdict, LlmError> {
        let user = format!(
            "Regulation excerpts:\n{context}\n---\nCustomer question: {customer_query}\nAgent answer: {agent_response}"
        );
        self.generate(ANALYSIS_PROMPT, user).await
    }
}

/// Parse a JSON reply, tolerating a surrounding markdown fence
pub fn parse_structured<T: DeserializeOwned>(content: &str) -> Result<T, LlmError> {
    let body = strip_code_fences(content);
    serde_json::from_str(body).map_err(|e| LlmError::Parse(e.to_string()))
}

/// Remove a leading ```/```json fence and its closing fence
pub fn strip_code_fences(input: &str) -> &str {
    let trimmed = input.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

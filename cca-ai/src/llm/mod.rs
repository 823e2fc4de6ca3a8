//! LLM structured-generation layer
//!
//! [`ComplianceModel`] is the seam the pipeline depends on: three typed calls
//! (segment, transform_query, analyze). [`StructuredLlm`] implements it over
//! any [`ChatProvider`]; tests substitute scripted fakes.

pub mod error;
pub mod openai_compat;
pub mod provider;
pub mod structured;

pub use error::LlmError;
pub use openai_compat::OpenAiCompatProvider;
pub use provider::{ChatMessage, ChatProvider, ChatRequest, ChatResponse, ResponseFormat};
pub use structured::StructuredLlm;

use crate::models::{AnalysisVerdict, SegmentDraft};
use async_trait::async_trait;

/// Typed LLM operations used by the analysis pipeline
///
/// Parse and validation failures are reported exactly like transport
/// failures.
#[async_trait]
pub trait ComplianceModel: Send + Sync {
    /// Split a transcript into relevant question/answer pairs, in order
    async fn segment(&self, transcript: &str) -> Result<Vec<SegmentDraft>, LlmError>;

    /// Rewrite a question/answer pair into a retrieval query
    async fn transform_query(
        &self,
        customer_query: &str,
        agent_response: &str,
    ) -> Result<String, LlmError>;

    /// Judge a question/answer pair against reference passages
    async fn analyze(
        &self,
        customer_query: &str,
        agent_response: &str,
        context: &str,
    ) -> Result<AnalysisVerdict, LlmError>;
}

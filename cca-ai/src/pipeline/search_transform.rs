//! Segment to retrieval-query rewriting

use crate::error::{AnalysisError, AnalysisResult, PipelineStage};
use crate::llm::ComplianceModel;
use crate::models::{SearchQuery, Segment};
use std::sync::Arc;

/// Turns a question/answer pair into a normalized search query
pub struct SearchTransform {
    model: Arc<dyn ComplianceModel>,
}

impl SearchTransform {
    pub fn new(model: Arc<dyn ComplianceModel>) -> Self {
        Self { model }
    }

    /// Generate the query; a blank result is a transformation failure
    pub async fn transform(&self, segment: &Segment) -> AnalysisResult<SearchQuery> {
        let raw = self
            .model
            .transform_query(&segment.customer_query, &segment.agent_response)
            .await
            .map_err(|e| AnalysisError::transformation(PipelineStage::QueryTransform, e))?;

        SearchQuery::new(&raw).ok_or_else(|| {
            AnalysisError::transformation(PipelineStage::QueryTransform, "empty search query")
        })
    }
}

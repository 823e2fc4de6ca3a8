//! Compliance judgement of one segment

use crate::error::{AnalysisError, AnalysisResult, PipelineStage};
use crate::llm::ComplianceModel;
use crate::models::{AnalysisVerdict, RetrievedContext, Segment};
use std::sync::Arc;

/// Judges a segment against retrieved regulation passages
pub struct Analyzer {
    model: Arc<dyn ComplianceModel>,
}

impl Analyzer {
    pub fn new(model: Arc<dyn ComplianceModel>) -> Self {
        Self { model }
    }

    /// Produce a verdict; the context may be empty or irrelevant
    ///
    /// The suggestion is cleared unless a flag is set. A verdict without
    /// analysis text is rejected.
    pub async fn analyze(
        &self,
        segment: &Segment,
        context: &RetrievedContext,
    ) -> AnalysisResult<AnalysisVerdict> {
        let verdict = self
            .model
            .analyze(
                &segment.customer_query,
                &segment.agent_response,
                &context.joined(),
            )
            .await
            .map_err(|e| AnalysisError::transformation(PipelineStage::Analysis, e))?;

        if verdict.analysis.trim().is_empty() {
            return Err(AnalysisError::transformation(
                PipelineStage::Analysis,
                "verdict has no analysis text",
            ));
        }

        Ok(verdict.normalized())
    }
}

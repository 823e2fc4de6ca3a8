//! Transcript segmentation

use crate::error::{AnalysisError, AnalysisResult, PipelineStage};
use crate::llm::ComplianceModel;
use crate::models::Segment;
use std::sync::Arc;
use tracing::debug;

/// Splits transcripts into indexed question/answer segments
pub struct Segmenter {
    model: Arc<dyn ComplianceModel>,
}

impl Segmenter {
    pub fn new(model: Arc<dyn ComplianceModel>) -> Self {
        Self { model }
    }

    /// Segment a transcript
    ///
    /// An empty vector means nothing relevant was found, which is not an
    /// error. Indices are assigned 1-based in model order.
    pub async fn segment(&self, transcript: &str) -> AnalysisResult<Vec<Segment>> {
        let drafts = self
            .model
            .segment(transcript)
            .await
            .map_err(|e| AnalysisError::transformation(PipelineStage::Segmentation, e))?;

        debug!(segments = drafts.len(), "Transcript segmented");

        Ok(drafts
            .into_iter()
            .enumerate()
            .map(|(i, draft)| Segment::new(i + 1, draft))
            .collect())
    }
}

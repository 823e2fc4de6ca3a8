//! Per-segment pipeline: query transform → retrieval → analysis
//!
//! A failure at any stage drops the segment. The outcome is tagged so the
//! caller can tell completed findings from drops and see why a segment was
//! dropped.

use super::{Analyzer, SearchTransform};
use crate::error::{AnalysisError, AnalysisResult, PipelineStage};
use crate::llm::ComplianceModel;
use crate::models::{AnalysisVerdict, RetrievedContext, SearchQuery, Segment, SegmentFinding};
use crate::retrieval::Retriever;
use std::sync::Arc;
use tracing::{debug, warn};

/// Characters of the customer query shown in drop warnings
const QUERY_PREVIEW_CHARS: usize = 50;

/// Segment left out of a call's findings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedSegment {
    /// 1-based segment index
    pub index: usize,
    /// Failing stage; `None` for errors raised outside the stages
    pub stage: Option<PipelineStage>,
    pub reason: String,
}

impl DroppedSegment {
    fn from_error(index: usize, error: &AnalysisError) -> Self {
        Self {
            index,
            stage: error.stage(),
            reason: error.to_string(),
        }
    }
}

/// Result of running one segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentOutcome {
    Completed(SegmentFinding),
    Dropped(DroppedSegment),
}

/// Runs the three per-segment stages with failure isolation
pub struct SegmentPipeline {
    search_transform: SearchTransform,
    retriever: Arc<dyn Retriever>,
    analyzer: Analyzer,
    top_k: usize,
}

impl SegmentPipeline {
    pub fn new(
        model: Arc<dyn ComplianceModel>,
        retriever: Arc<dyn Retriever>,
        top_k: usize,
    ) -> Self {
        Self {
            search_transform: SearchTransform::new(model.clone()),
            retriever,
            analyzer: Analyzer::new(model),
            top_k,
        }
    }

    /// Analyze one segment; never fails, failures become `Dropped`
    pub async fn run(&self, call_id: &str, segment: Segment) -> SegmentOutcome {
        match self.try_run(&segment).await {
            Ok((search_query, context, verdict)) => {
                debug!(
                    call_id = %call_id,
                    segment_index = segment.index,
                    passages = context.passages.len(),
                    violation = verdict.violation_detected,
                    omission = verdict.omission_detected,
                    "Segment analyzed"
                );
                SegmentOutcome::Completed(SegmentFinding {
                    segment,
                    search_query,
                    context,
                    verdict,
                })
            }
            Err(e) => {
                let dropped = DroppedSegment::from_error(segment.index, &e);
                warn!(
                    call_id = %call_id,
                    segment_index = segment.index,
                    stage = ?dropped.stage,
                    query = %preview(&segment.customer_query, QUERY_PREVIEW_CHARS),
                    error = %e,
                    "Segment dropped"
                );
                SegmentOutcome::Dropped(dropped)
            }
        }
    }

    async fn try_run(
        &self,
        segment: &Segment,
    ) -> AnalysisResult<(SearchQuery, RetrievedContext, AnalysisVerdict)> {
        let search_query = self.search_transform.transform(segment).await?;

        let passages = self
            .retriever
            .retrieve(search_query.as_str(), self.top_k)
            .await?;
        let context = RetrievedContext::new(passages);
        if context.is_empty() {
            debug!(segment_index = segment.index, "No reference passages retrieved");
        }

        let verdict = self.analyzer.analyze(segment, &context).await?;

        Ok((search_query, context, verdict))
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

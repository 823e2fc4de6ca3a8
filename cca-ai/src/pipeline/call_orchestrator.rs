//! Per-call orchestration
//!
//! Segments the transcript once, then runs every segment concurrently and
//! waits for all of them. Segment drops never fail the call.

use super::{DroppedSegment, SegmentOutcome, SegmentPipeline, Segmenter};
use crate::error::AnalysisResult;
use crate::llm::ComplianceModel;
use crate::models::{CallRecord, SegmentFinding};
use crate::retrieval::Retriever;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info};

/// Aggregated result of one call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallAnalysis {
    /// Segments produced by the segmenter
    pub segments_total: usize,
    /// Completed findings, ordered by segment index
    pub findings: Vec<SegmentFinding>,
    /// Segments dropped along the way, ordered by segment index
    pub dropped: Vec<DroppedSegment>,
}

impl CallAnalysis {
    /// True when nothing will be persisted for the call
    pub fn has_no_findings(&self) -> bool {
        self.findings.is_empty()
    }
}

/// Runs segmentation and the segment fan-out for one call
pub struct CallOrchestrator {
    segmenter: Segmenter,
    segment_pipeline: SegmentPipeline,
}

impl CallOrchestrator {
    pub fn new(
        model: Arc<dyn ComplianceModel>,
        retriever: Arc<dyn Retriever>,
        top_k: usize,
    ) -> Self {
        Self {
            segmenter: Segmenter::new(model.clone()),
            segment_pipeline: SegmentPipeline::new(model, retriever, top_k),
        }
    }

    /// Analyze a call
    ///
    /// # Returns
    /// * `Err` only when segmentation fails
    /// * `Ok` with possibly empty findings otherwise
    pub async fn analyze_call(&self, call: &CallRecord) -> AnalysisResult<CallAnalysis> {
        debug!(call_id = %call.call_id, "Segmenting transcript");

        let segments = self.segmenter.segment(&call.transcript).await?;
        let segments_total = segments.len();

        if segments.is_empty() {
            info!(call_id = %call.call_id, "No relevant segments found");
            return Ok(CallAnalysis::default());
        }

        let outcomes = join_all(
            segments
                .into_iter()
                .map(|segment| self.segment_pipeline.run(&call.call_id, segment)),
        )
        .await;

        let mut analysis = CallAnalysis {
            segments_total,
            ..Default::default()
        };
        for outcome in outcomes {
            match outcome {
                SegmentOutcome::Completed(finding) => analysis.findings.push(finding),
                SegmentOutcome::Dropped(dropped) => analysis.dropped.push(dropped),
            }
        }
        analysis.findings.sort_by_key(SegmentFinding::segment_index);
        analysis.dropped.sort_by_key(|d| d.index);

        info!(
            call_id = %call.call_id,
            segments = segments_total,
            findings = analysis.findings.len(),
            dropped = analysis.dropped.len(),
            "Call analyzed"
        );

        Ok(analysis)
    }
}

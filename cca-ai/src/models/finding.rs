//! Analyzer verdicts and compliance findings

use super::segment::{RetrievedContext, SearchQuery, Segment};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Structured judgement of one segment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisVerdict {
    /// Agent response contradicts the retrieved regulation
    pub violation_detected: bool,
    /// Agent withheld information the regulation requires
    pub omission_detected: bool,
    /// Short explanation
    pub analysis: String,
    /// Corrective guidance; only meaningful when a flag is set
    #[serde(default)]
    pub suggestion: Option<String>,
}

impl AnalysisVerdict {
    pub fn is_compliant(&self) -> bool {
        !self.violation_detected && !self.omission_detected
    }

    /// Drop the suggestion when no flag is set or when it is blank
    pub fn normalized(mut self) -> Self {
        let keep = !self.is_compliant()
            && self
                .suggestion
                .as_deref()
                .is_some_and(|s| !s.trim().is_empty());
        if keep {
            self.suggestion = self.suggestion.map(|s| s.trim().to_string());
        } else {
            self.suggestion = None;
        }
        self
    }
}

/// Completed analysis of one segment, not yet persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentFinding {
    pub segment: Segment,
    pub search_query: SearchQuery,
    pub context: RetrievedContext,
    pub verdict: AnalysisVerdict,
}

impl SegmentFinding {
    pub fn segment_index(&self) -> usize {
        self.segment.index
    }
}

/// Persisted finding (`compliance_findings` row)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceFinding {
    pub id: i64,
    /// `calls_input.id` of the owning call
    pub input_call_id: i64,
    pub segment_index: i64,
    pub customer_query: String,
    pub agent_response: String,
    pub search_query: String,
    /// Passages in retrieval order
    pub rag_context: Vec<String>,
    pub violation_detected: bool,
    pub omission_detected: bool,
    pub analysis: String,
    pub suggestion: Option<String>,
    pub processed_at: DateTime<Utc>,
}

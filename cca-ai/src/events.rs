//! Pipeline progress events
//!
//! Emitted by the batch scheduler over an optional channel. Failures are
//! still reported through call status and logs; events only mirror them.

use crate::error::PipelineStage;
use crate::models::CallStatus;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Batch scheduler progress event
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PipelineEvent {
    /// Pending calls selected for a batch
    BatchStarted {
        batch_id: Uuid,
        /// Number of calls in the batch
        call_count: usize,
        /// Unix timestamp (seconds since epoch)
        timestamp: i64,
    },

    /// Segment failed and was left out of the call's findings
    SegmentDropped {
        batch_id: Uuid,
        call_id: String,
        /// 1-based segment index
        segment_index: usize,
        stage: Option<PipelineStage>,
        reason: String,
    },

    /// Call analysis finished (before commit)
    CallSettled {
        batch_id: Uuid,
        call_id: String,
        /// Status the call will receive if the batch commits
        status: CallStatus,
        findings: usize,
    },

    /// Batch transaction committed
    BatchCommitted {
        batch_id: Uuid,
        calls: usize,
        findings: usize,
        duration_ms: u64,
    },

    /// Batch transaction rolled back; the scheduler stops
    BatchCommitFailed { batch_id: Uuid, error: String },
}

//! Call record and its lifecycle status

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a call
///
/// A call leaves `Pending` exactly once per processing attempt and never
/// returns to it automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    /// Awaiting analysis
    Pending,
    /// At least one finding persisted
    Processed,
    /// Analysis produced no findings
    ProcessedNoSegment,
    /// Segmentation failed; nothing persisted
    Failed,
    /// Findings existed but could not be written
    FailedWritingDb,
}

impl CallStatus {
    /// All statuses, pending first
    pub const ALL: [CallStatus; 5] = [
        CallStatus::Pending,
        CallStatus::Processed,
        CallStatus::ProcessedNoSegment,
        CallStatus::Failed,
        CallStatus::FailedWritingDb,
    ];

    /// Convert to database string
    pub fn as_str(&self) -> &'static str {
        match self {
            CallStatus::Pending => "pending",
            CallStatus::Processed => "processed",
            CallStatus::ProcessedNoSegment => "processed_no_segment",
            CallStatus::Failed => "failed",
            CallStatus::FailedWritingDb => "failed_writing_db",
        }
    }

    /// Parse from database string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(CallStatus::Pending),
            "processed" => Some(CallStatus::Processed),
            "processed_no_segment" => Some(CallStatus::ProcessedNoSegment),
            "failed" => Some(CallStatus::Failed),
            "failed_writing_db" => Some(CallStatus::FailedWritingDb),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, CallStatus::Pending)
    }
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One call transcript awaiting or having undergone analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRecord {
    /// Row id (`calls_input.id`), referenced by findings
    pub id: i64,
    /// External identifier assigned at ingestion
    pub call_id: String,
    pub transcript: String,
    pub status: CallStatus,
    /// ISO 8601 creation time
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_string_mapping() {
        for status in CallStatus::ALL {
            assert_eq!(CallStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(CallStatus::parse("processing"), None);
    }

    #[test]
    fn test_only_pending_is_not_terminal() {
        let terminal: Vec<_> = CallStatus::ALL.iter().filter(|s| s.is_terminal()).collect();
        assert_eq!(terminal.len(), 4);
        assert!(!CallStatus::Pending.is_terminal());
    }
}

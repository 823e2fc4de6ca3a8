//! Data models for the analysis pipeline

pub mod call;
pub mod finding;
pub mod segment;

pub use call::{CallRecord, CallStatus};
pub use finding::{AnalysisVerdict, ComplianceFinding, SegmentFinding};
pub use segment::{RetrievedContext, SearchQuery, Segment, SegmentDraft};

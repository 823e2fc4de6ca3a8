//! Per-call analysis pipeline
//!
//! # Architecture
//! - [`Segmenter`] splits a transcript into question/answer segments
//! - [`SegmentPipeline`] runs [`SearchTransform`] → [`Retriever`] → [`Analyzer`]
//!   for one segment and reports a tagged outcome
//! - [`CallOrchestrator`] fans the segment pipeline out over every segment of
//!   a call and collects the completed findings in index order
//!
//! # Error Handling
//! - Segment failures are isolated: the segment is dropped, siblings continue
//! - Segmentation failure fails the whole call
//!
//! [`Retriever`]: crate::retrieval::Retriever

pub mod analyzer;
pub mod call_orchestrator;
pub mod search_transform;
pub mod segment_pipeline;
pub mod segmenter;

pub use analyzer::Analyzer;
pub use call_orchestrator::{CallAnalysis, CallOrchestrator};
pub use search_transform::SearchTransform;
pub use segment_pipeline::{DroppedSegment, SegmentOutcome, SegmentPipeline};
pub use segmenter::Segmenter;

//! cca-ai library interface
//!
//! Transcript compliance analysis: segments call transcripts with an LLM,
//! retrieves regulatory passages for each segment, and persists per-segment
//! findings. Exposes public APIs for the binary and for integration testing.

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod retrieval;
pub mod scheduler;
pub mod utils;

pub use crate::error::{AnalysisError, AnalysisResult, PipelineStage};
pub use crate::events::PipelineEvent;
pub use crate::pipeline::{CallAnalysis, CallOrchestrator, SegmentOutcome, SegmentPipeline};
pub use crate::scheduler::{BatchReport, BatchScheduler, SchedulerReport};

//! Error types for cca-ai
//!
//! Failures are classified by the scope that recovers them:
//! - `Transformation` and `Retrieval` are local to a segment, except a
//!   segmentation failure which fails the whole call
//! - `Persistence` aborts the scheduler loop after the batch rolls back

use crate::retrieval::RetrievalError;
use std::fmt;
use thiserror::Error;

/// Result type for analysis operations
pub type AnalysisResult<T> = std::result::Result<T, AnalysisError>;

/// Stage of the per-call pipeline that produced a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Transcript split into question/answer segments
    Segmentation,
    /// Segment rewritten into a retrieval query
    QueryTransform,
    /// Reference passages fetched from the document index
    Retrieval,
    /// Segment judged against the retrieved passages
    Analysis,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Segmentation => "segmentation",
            PipelineStage::QueryTransform => "query_transform",
            PipelineStage::Retrieval => "retrieval",
            PipelineStage::Analysis => "analysis",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Analysis pipeline error
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// LLM generation failed or produced output that did not validate
    #[error("{stage} failed: {message}")]
    Transformation {
        stage: PipelineStage,
        message: String,
    },

    /// Document index could not serve the query
    #[error("Retrieval failed: {0}")]
    Retrieval(#[from] RetrievalError),

    /// Durable store rejected a read or write
    #[error("Persistence failed: {0}")]
    Persistence(#[from] sqlx::Error),

    /// Invalid tunables or missing credentials
    #[error("Configuration error: {0}")]
    Config(String),

    /// cca-common error
    #[error("Common error: {0}")]
    Common(#[from] cca_common::Error),
}

impl AnalysisError {
    /// Build a transformation failure for the given stage
    pub fn transformation(stage: PipelineStage, message: impl fmt::Display) -> Self {
        AnalysisError::Transformation {
            stage,
            message: message.to_string(),
        }
    }

    /// Stage that failed, when the error came from the pipeline
    pub fn stage(&self) -> Option<PipelineStage> {
        match self {
            AnalysisError::Transformation { stage, .. } => Some(*stage),
            AnalysisError::Retrieval(_) => Some(PipelineStage::Retrieval),
            _ => None,
        }
    }

    /// True for failures of the durable store
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            AnalysisError::Persistence(_) | AnalysisError::Common(cca_common::Error::Database(_))
        )
    }
}

//! Reference-passage retrieval
//!
//! The pipeline depends only on [`Retriever`]; [`IndexServiceClient`] talks
//! to an external document index over HTTP.

pub mod index_client;

pub use index_client::IndexServiceClient;

use async_trait::async_trait;
use thiserror::Error;

/// Retrieval errors
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// Index could not be reached or refused the query
    #[error("index unavailable: {0}")]
    Unavailable(String),

    /// Reply was not a passage list
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Client construction or transport error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Top-k passage lookup against a document index
///
/// Read-only and idempotent; results are ranked by relevance and hold at
/// most `k` passages. Failures are returned, never retried.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<String>, RetrievalError>;
}

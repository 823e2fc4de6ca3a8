//! HTTP client for the document index service
//!
//! `POST {base_url}/retrieve` with `{"query": .., "k": ..}`; the service
//! answers `{"passages": [..]}` ranked by relevance.

use super::{RetrievalError, Retriever};
use async_trait::async_trait;
use cca_common::config::RetrievalConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("cca-ai/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Serialize)]
struct RetrieveRequest<'a> {
    query: &'a str,
    k: usize,
}

#[derive(Debug, Deserialize)]
struct RetrieveResponse {
    passages: Vec<String>,
}

/// Document index service client
pub struct IndexServiceClient {
    http: reqwest::Client,
    base_url: String,
}

impl IndexServiceClient {
    pub fn new(config: &RetrievalConfig) -> Result<Self, RetrievalError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
        })
    }

    fn retrieve_url(&self) -> String {
        format!("{}/retrieve", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl Retriever for IndexServiceClient {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<String>, RetrievalError> {
        let response = self
            .http
            .post(self.retrieve_url())
            .json(&RetrieveRequest { query, k })
            .send()
            .await
            .map_err(|e| RetrievalError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RetrievalError::Unavailable(format!("HTTP {status}: {body}")));
        }

        let mut reply: RetrieveResponse = response
            .json()
            .await
            .map_err(|e| RetrievalError::InvalidResponse(e.to_string()))?;

        reply.passages.truncate(k);
        debug!(k, returned = reply.passages.len(), "passages retrieved");

        Ok(reply.passages)
    }
}

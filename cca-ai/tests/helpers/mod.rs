//! Shared fixtures for cca-ai integration tests
//!
//! `ScriptedModel` reads its behaviour from the transcript text so each test
//! can describe a call inline:
//! - a line `Q: <question> || A: <answer>` becomes a segment; other lines
//!   (greetings, verification) are skipped
//! - `SEGMENTER_FAIL` anywhere in the transcript fails segmentation
//! - markers inside a question fail one stage for that segment:
//!   `FAIL_QUERY`, `EMPTY_QUERY`, `FAIL_RETRIEVAL`, `FAIL_ANALYSIS`
//! - `SLOW` inside a question delays its analysis
//!
//! Verdicts compare month counts: a violation is flagged when the answer
//! offers more months than the retrieved "max N months" allows.

#![allow(dead_code)]

use async_trait::async_trait;
use cca_ai::llm::{ComplianceModel, LlmError};
use cca_ai::models::{AnalysisVerdict, SegmentDraft};
use cca_ai::retrieval::{RetrievalError, Retriever};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub const LOAN_RULE: &str = "Consumer loans: max 12 months term.";

#[derive(Default)]
pub struct ScriptedModel {
    segment_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    /// Delay inside `segment` so concurrent calls overlap
    pub segment_delay: Option<Duration>,
    pub contexts_seen: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_segment_delay(delay: Duration) -> Self {
        Self {
            segment_delay: Some(delay),
            ..Default::default()
        }
    }

    pub fn segment_calls(&self) -> usize {
        self.segment_calls.load(Ordering::SeqCst)
    }

    /// Highest number of concurrent `segment` calls observed
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ComplianceModel for ScriptedModel {
    async fn segment(&self, transcript: &str) -> Result<Vec<SegmentDraft>, LlmError> {
        self.segment_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.segment_delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if transcript.contains("SEGMENTER_FAIL") {
            return Err(LlmError::Parse("expected field `segments`".to_string()));
        }

        Ok(transcript
            .lines()
            .filter_map(|line| {
                let (q, a) = line.split_once("||")?;
                Some(SegmentDraft {
                    customer_query: q.trim().trim_start_matches("Q:").trim().to_string(),
                    agent_response: a.trim().trim_start_matches("A:").trim().to_string(),
                })
            })
            .collect())
    }

    async fn transform_query(
        &self,
        customer_query: &str,
        _agent_response: &str,
    ) -> Result<String, LlmError> {
        if customer_query.contains("FAIL_QUERY") {
            return Err(LlmError::RequestFailed("HTTP 500: upstream".to_string()));
        }
        if customer_query.contains("EMPTY_QUERY") {
            return Ok("   ".to_string());
        }
        Ok(format!("regulation for {}", customer_query))
    }

    async fn analyze(
        &self,
        customer_query: &str,
        agent_response: &str,
        context: &str,
    ) -> Result<AnalysisVerdict, LlmError> {
        self.contexts_seen.lock().unwrap().push(context.to_string());

        if customer_query.contains("SLOW") {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        if customer_query.contains("FAIL_ANALYSIS") {
            return Err(LlmError::Parse("missing field `analysis`".to_string()));
        }

        let limit = months_in(context);
        let offered = months_in(agent_response);
        let violation = matches!((limit, offered), (Some(limit), Some(offered)) if offered > limit);

        Ok(AnalysisVerdict {
            violation_detected: violation,
            omission_detected: false,
            analysis: if violation {
                "Offered term exceeds the regulatory maximum".to_string()
            } else {
                "Answer is consistent with the regulation".to_string()
            },
            // Always present so tests can check it is cleared for compliant answers
            suggestion: Some("State the maximum term allowed".to_string()),
        })
    }
}

/// First number directly followed by "months"
fn months_in(text: &str) -> Option<u32> {
    let words: Vec<&str> = text.split_whitespace().collect();
    words.windows(2).find_map(|pair| {
        if pair[1].trim_matches(|c: char| !c.is_alphanumeric()) == "months" {
            pair[0].parse().ok()
        } else {
            None
        }
    })
}

/// Retriever returning a fixed passage list
pub struct StaticRetriever {
    passages: Vec<String>,
    pub queries: Mutex<Vec<(String, usize)>>,
}

impl StaticRetriever {
    pub fn new(passages: &[&str]) -> Self {
        Self {
            passages: passages.iter().map(|p| p.to_string()).collect(),
            queries: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Retriever for StaticRetriever {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<String>, RetrievalError> {
        self.queries.lock().unwrap().push((query.to_string(), k));
        if query.contains("FAIL_RETRIEVAL") {
            return Err(RetrievalError::Unavailable("index offline".to_string()));
        }
        Ok(self.passages.iter().take(k).cloned().collect())
    }
}

/// In-memory database with the full schema
///
/// One connection that is never recycled, so the database lives as long as
/// the pool.
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    cca_common::db::create_schema(&pool).await.unwrap();
    pool
}

pub async fn status_of(pool: &SqlitePool, call_id: &str) -> String {
    sqlx::query_scalar("SELECT status FROM calls_input WHERE call_id = ?")
        .bind(call_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn finding_count(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM compliance_findings")
        .fetch_one(pool)
        .await
        .unwrap()
}

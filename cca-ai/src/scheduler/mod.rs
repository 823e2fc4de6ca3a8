//! Batch scheduler
//!
//! Durable job loop over `calls_input`:
//! 1. Select up to `batch_size` pending calls (insertion order)
//! 2. Analyze them concurrently, bounded by `batch_size`, waiting for all
//! 3. Persist every status transition and finding in one transaction
//!
//! Call failures become statuses. Only a failed commit stops the loop; the
//! batch is rolled back and its calls stay pending.
//!
//! Each call's findings and status are written under a savepoint. When an
//! insert fails the savepoint is rolled back and the call is marked
//! `failed_writing_db` while the rest of the batch commits. A call that left
//! `pending` while it was analyzed keeps its status and gets no findings.

use crate::config::PipelineConfig;
use crate::db;
use crate::error::{AnalysisError, AnalysisResult};
use crate::events::PipelineEvent;
use crate::models::{CallRecord, CallStatus};
use crate::pipeline::{CallAnalysis, CallOrchestrator};
use crate::utils::begin_monitored;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use sqlx::{Acquire, Sqlite, SqliteConnection, SqlitePool, Transaction};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Totals over a scheduler run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerReport {
    /// Batches committed
    pub batches: usize,
    /// Calls moved out of pending
    pub calls: usize,
    /// Findings persisted
    pub findings: usize,
}

/// Outcome of one committed batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub batch_id: Uuid,
    pub calls: usize,
    pub findings: usize,
    /// Calls per terminal status
    pub statuses: HashMap<CallStatus, usize>,
}

impl BatchReport {
    pub fn count(&self, status: CallStatus) -> usize {
        self.statuses.get(&status).copied().unwrap_or(0)
    }
}

/// Call whose analysis has finished, awaiting commit
struct SettledCall {
    call: CallRecord,
    result: AnalysisResult<CallAnalysis>,
}

impl SettledCall {
    /// Status the call receives when its findings (if any) are written
    fn planned_status(&self) -> CallStatus {
        match &self.result {
            Err(_) => CallStatus::Failed,
            Ok(analysis) if analysis.has_no_findings() => CallStatus::ProcessedNoSegment,
            Ok(_) => CallStatus::Processed,
        }
    }

    fn finding_count(&self) -> usize {
        self.result.as_ref().map(|a| a.findings.len()).unwrap_or(0)
    }
}

/// Pulls pending calls in batches and commits their outcomes
pub struct BatchScheduler {
    db: SqlitePool,
    orchestrator: Arc<CallOrchestrator>,
    config: PipelineConfig,
    event_tx: Option<mpsc::Sender<PipelineEvent>>,
}

impl BatchScheduler {
    pub fn new(db: SqlitePool, orchestrator: Arc<CallOrchestrator>, config: PipelineConfig) -> Self {
        Self {
            db,
            orchestrator,
            config,
            event_tx: None,
        }
    }

    /// Create scheduler with event channel for progress reporting
    pub fn with_events(
        db: SqlitePool,
        orchestrator: Arc<CallOrchestrator>,
        config: PipelineConfig,
        event_tx: mpsc::Sender<PipelineEvent>,
    ) -> Self {
        Self {
            db,
            orchestrator,
            config,
            event_tx: Some(event_tx),
        }
    }

    /// Process batches until no pending call remains
    ///
    /// Returns the error of the first batch whose commit failed.
    pub async fn run(&self) -> AnalysisResult<SchedulerReport> {
        let mut report = SchedulerReport::default();

        while let Some(batch) = self.run_batch().await? {
            report.batches += 1;
            report.calls += batch.calls;
            report.findings += batch.findings;
        }

        info!(
            batches = report.batches,
            calls = report.calls,
            findings = report.findings,
            "No pending calls left"
        );

        Ok(report)
    }

    /// Process a single batch
    ///
    /// # Returns
    /// * `Ok(None)` when no call is pending
    /// * `Ok(Some(report))` after the batch committed
    /// * `Err` when the commit failed (batch rolled back)
    pub async fn run_batch(&self) -> AnalysisResult<Option<BatchReport>> {
        let calls = db::calls::fetch_pending(&self.db, self.config.batch_size).await?;
        if calls.is_empty() {
            return Ok(None);
        }

        let batch_id = Uuid::new_v4();
        let started = Instant::now();

        info!(batch_id = %batch_id, calls = calls.len(), "Batch started");
        self.emit_event(PipelineEvent::BatchStarted {
            batch_id,
            call_count: calls.len(),
            timestamp: Utc::now().timestamp(),
        })
        .await;

        let settled = self.settle(batch_id, calls).await;

        let applied = match self.commit_batch(batch_id, &settled).await {
            Ok(applied) => applied,
            Err(e) => {
                error!(batch_id = %batch_id, error = %e, "Batch commit failed, rolled back");
                self.emit_event(PipelineEvent::BatchCommitFailed {
                    batch_id,
                    error: e.to_string(),
                })
                .await;
                return Err(e);
            }
        };

        let mut report = BatchReport {
            batch_id,
            calls: 0,
            findings: 0,
            statuses: HashMap::new(),
        };
        for (status, findings) in applied {
            report.calls += 1;
            report.findings += findings;
            *report.statuses.entry(status).or_insert(0) += 1;
        }

        let duration_ms = started.elapsed().as_millis() as u64;
        info!(
            batch_id = %batch_id,
            calls = report.calls,
            findings = report.findings,
            processed = report.count(CallStatus::Processed),
            no_segment = report.count(CallStatus::ProcessedNoSegment),
            failed = report.count(CallStatus::Failed),
            failed_writing_db = report.count(CallStatus::FailedWritingDb),
            duration_ms,
            "Batch committed"
        );
        self.emit_event(PipelineEvent::BatchCommitted {
            batch_id,
            calls: report.calls,
            findings: report.findings,
            duration_ms,
        })
        .await;

        Ok(Some(report))
    }

    /// Analyze all calls of a batch concurrently and wait for every one
    async fn settle(&self, batch_id: Uuid, calls: Vec<CallRecord>) -> Vec<SettledCall> {
        let mut settled: Vec<SettledCall> = stream::iter(calls)
            .map(|call| async move {
                let result = self.orchestrator.analyze_call(&call).await;
                SettledCall { call, result }
            })
            .buffer_unordered(self.config.batch_size.max(1))
            .collect()
            .await;

        settled.sort_by_key(|s| s.call.id);

        for item in &settled {
            match &item.result {
                Ok(analysis) => {
                    for dropped in &analysis.dropped {
                        self.emit_event(PipelineEvent::SegmentDropped {
                            batch_id,
                            call_id: item.call.call_id.clone(),
                            segment_index: dropped.index,
                            stage: dropped.stage,
                            reason: dropped.reason.clone(),
                        })
                        .await;
                    }
                }
                Err(e) => {
                    error!(
                        batch_id = %batch_id,
                        call_id = %item.call.call_id,
                        error = %e,
                        "Call analysis failed"
                    );
                }
            }

            self.emit_event(PipelineEvent::CallSettled {
                batch_id,
                call_id: item.call.call_id.clone(),
                status: item.planned_status(),
                findings: item.finding_count(),
            })
            .await;
        }

        settled
    }

    /// Write every settled call in one transaction
    ///
    /// Returns the applied status and persisted finding count per call.
    /// Calls that left `pending` during analysis are not included.
    async fn commit_batch(
        &self,
        batch_id: Uuid,
        settled: &[SettledCall],
    ) -> AnalysisResult<Vec<(CallStatus, usize)>> {
        let mut tx = begin_monitored(&self.db, "scheduler::commit_batch").await?;
        let processed_at = Utc::now();
        let mut applied = Vec::with_capacity(settled.len());

        for item in settled {
            match apply_call(tx.inner_mut()?, item, processed_at).await? {
                Some(outcome) => applied.push(outcome),
                None => warn!(
                    batch_id = %batch_id,
                    call_id = %item.call.call_id,
                    "Call no longer pending, outcome discarded"
                ),
            }
        }

        tx.commit().await?;
        Ok(applied)
    }

    async fn emit_event(&self, event: PipelineEvent) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.send(event).await;
        }
    }
}

/// Write one call's findings and status under a savepoint
///
/// The status update is guarded on `pending`. When the row has already left
/// `pending`, the savepoint is rolled back and `None` is returned: nothing
/// from this attempt is kept. A failed finding insert rolls back the
/// savepoint and marks the call `failed_writing_db`. Errors are reserved for
/// failures of the savepoint or the status update.
async fn apply_call(
    tx: &mut Transaction<'_, Sqlite>,
    item: &SettledCall,
    processed_at: DateTime<Utc>,
) -> AnalysisResult<Option<(CallStatus, usize)>> {
    let call = &item.call;
    let mut savepoint = (&mut *tx).begin().await?;

    let (status, written) = match &item.result {
        Ok(analysis) if !analysis.has_no_findings() => {
            match insert_findings(&mut savepoint, call, analysis, processed_at).await {
                Ok(written) => (CallStatus::Processed, written),
                Err(_) => {
                    savepoint.rollback().await.map_err(AnalysisError::Persistence)?;

                    let updated =
                        db::calls::update_status(&mut **tx, call.id, CallStatus::FailedWritingDb)
                            .await?;
                    return Ok(updated.then_some((CallStatus::FailedWritingDb, 0)));
                }
            }
        }
        _ => (item.planned_status(), 0),
    };

    if !db::calls::update_status(&mut savepoint, call.id, status).await? {
        savepoint.rollback().await.map_err(AnalysisError::Persistence)?;
        return Ok(None);
    }

    savepoint.commit().await?;
    Ok(Some((status, written)))
}

async fn insert_findings(
    conn: &mut SqliteConnection,
    call: &CallRecord,
    analysis: &CallAnalysis,
    processed_at: DateTime<Utc>,
) -> cca_common::Result<usize> {
    for finding in &analysis.findings {
        if let Err(e) = db::findings::insert_finding(conn, call.id, finding, processed_at).await {
            error!(
                call_id = %call.call_id,
                segment_index = finding.segment_index(),
                error = %e,
                "Writing findings failed"
            );
            return Err(e);
        }
    }
    Ok(analysis.findings.len())
}

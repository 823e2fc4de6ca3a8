//! Compliance finding persistence
//!
//! Findings are append-only. `rag_context` holds the retrieved passages as a
//! JSON array so their order and boundaries survive verbatim.

use crate::models::{ComplianceFinding, SegmentFinding};
use cca_common::{Error, Result};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqliteConnection, SqlitePool};

/// Insert one finding for the call with row id `input_call_id`
///
/// Runs on the caller's connection so it joins the batch transaction.
pub async fn insert_finding(
    conn: &mut SqliteConnection,
    input_call_id: i64,
    finding: &SegmentFinding,
    processed_at: DateTime<Utc>,
) -> Result<i64> {
    let rag_context = serde_json::to_string(&finding.context.passages)
        .map_err(|e| Error::Internal(format!("Serialize rag_context failed: {}", e)))?;

    let result = sqlx::query(
        r#"
        INSERT INTO compliance_findings (
            input_call_id, segment_index, customer_query, agent_response,
            search_query, rag_context, violation_detected, omission_detected,
            analysis, suggestion, processed_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(input_call_id)
    .bind(finding.segment.index as i64)
    .bind(&finding.segment.customer_query)
    .bind(&finding.segment.agent_response)
    .bind(finding.search_query.as_str())
    .bind(rag_context)
    .bind(finding.verdict.violation_detected)
    .bind(finding.verdict.omission_detected)
    .bind(&finding.verdict.analysis)
    .bind(finding.verdict.suggestion.as_deref())
    .bind(processed_at.to_rfc3339())
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Load a call's findings ordered by segment index
pub async fn load_findings_for_call(
    pool: &SqlitePool,
    input_call_id: i64,
) -> Result<Vec<ComplianceFinding>> {
    let rows = sqlx::query(
        r#"
        SELECT id, input_call_id, segment_index, customer_query, agent_response,
               search_query, rag_context, violation_detected, omission_detected,
               analysis, suggestion, processed_at
        FROM compliance_findings
        WHERE input_call_id = ?
        ORDER BY segment_index
        "#,
    )
    .bind(input_call_id)
    .fetch_all(pool)
    .await?;

    let mut findings = Vec::with_capacity(rows.len());
    for row in rows {
        let rag_context: String = row.try_get("rag_context")?;
        let rag_context: Vec<String> = serde_json::from_str(&rag_context)
            .map_err(|e| Error::Internal(format!("Parse rag_context failed: {}", e)))?;

        let processed_at: String = row.try_get("processed_at")?;
        let processed_at = DateTime::parse_from_rfc3339(&processed_at)
            .map_err(|e| Error::Internal(format!("Parse processed_at failed: {}", e)))?
            .with_timezone(&Utc);

        findings.push(ComplianceFinding {
            id: row.try_get("id")?,
            input_call_id: row.try_get("input_call_id")?,
            segment_index: row.try_get("segment_index")?,
            customer_query: row.try_get("customer_query")?,
            agent_response: row.try_get("agent_response")?,
            search_query: row.try_get("search_query")?,
            rag_context,
            violation_detected: row.try_get("violation_detected")?,
            omission_detected: row.try_get("omission_detected")?,
            analysis: row.try_get("analysis")?,
            suggestion: row.try_get("suggestion")?,
            processed_at,
        });
    }

    Ok(findings)
}

//! Call record persistence
//!
//! Rows are created by ingestion (`insert_call`) and afterwards only their
//! status changes, through `update_status` inside the batch transaction.

use crate::models::{CallRecord, CallStatus};
use cca_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use std::collections::HashMap;

/// Register a transcript for analysis
///
/// Idempotent on `call_id`: an existing call keeps its transcript and
/// status. Returns the row id.
pub async fn insert_call(pool: &SqlitePool, call_id: &str, transcript: &str) -> Result<i64> {
    sqlx::query(
        r#"
        INSERT INTO calls_input (call_id, transcript)
        VALUES (?, ?)
        ON CONFLICT(call_id) DO NOTHING
        "#,
    )
    .bind(call_id)
    .bind(transcript)
    .execute(pool)
    .await?;

    let id: i64 = sqlx::query_scalar("SELECT id FROM calls_input WHERE call_id = ?")
        .bind(call_id)
        .fetch_one(pool)
        .await?;

    Ok(id)
}

/// Select up to `limit` pending calls in insertion order
pub async fn fetch_pending(pool: &SqlitePool, limit: usize) -> Result<Vec<CallRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT id, call_id, transcript, status, created_at
        FROM calls_input
        WHERE status = 'pending'
        ORDER BY id
        LIMIT ?
        "#,
    )
    .bind(limit as i64)
    .fetch_all(pool)
    .await?;

    rows.iter().map(call_from_row).collect()
}

/// Load a call by row id
pub async fn load_call(pool: &SqlitePool, id: i64) -> Result<Option<CallRecord>> {
    let row = sqlx::query(
        r#"
        SELECT id, call_id, transcript, status, created_at
        FROM calls_input
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(call_from_row).transpose()
}

/// Number of calls per status (statuses with no calls are omitted)
pub async fn count_by_status(pool: &SqlitePool) -> Result<HashMap<CallStatus, i64>> {
    let rows: Vec<(String, i64)> =
        sqlx::query_as("SELECT status, COUNT(*) FROM calls_input GROUP BY status")
            .fetch_all(pool)
            .await?;

    rows.into_iter()
        .map(|(status, count)| parse_status(&status).map(|status| (status, count)))
        .collect()
}

/// Move a pending call to `status`
///
/// Only pending rows are touched, so a call transitions at most once per
/// attempt. Returns false when the call was no longer pending.
pub async fn update_status(conn: &mut SqliteConnection, id: i64, status: CallStatus) -> Result<bool> {
    let result = sqlx::query("UPDATE calls_input SET status = ? WHERE id = ? AND status = 'pending'")
        .bind(status.as_str())
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() == 1)
}

fn call_from_row(row: &SqliteRow) -> Result<CallRecord> {
    let status: String = row.try_get("status")?;

    Ok(CallRecord {
        id: row.try_get("id")?,
        call_id: row.try_get("call_id")?,
        transcript: row.try_get("transcript")?,
        status: parse_status(&status)?,
        created_at: row.try_get("created_at")?,
    })
}

fn parse_status(value: &str) -> Result<CallStatus> {
    CallStatus::parse(value)
        .ok_or_else(|| Error::Internal(format!("Unknown call status in database: {}", value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        cca_common::db::create_schema(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_insert_call_is_idempotent() {
        let pool = setup_test_db().await;

        let first = insert_call(&pool, "call-1", "original").await.unwrap();
        let second = insert_call(&pool, "call-1", "replacement").await.unwrap();
        assert_eq!(first, second);

        let call = load_call(&pool, first).await.unwrap().unwrap();
        assert_eq!(call.transcript, "original");
        assert_eq!(call.status, CallStatus::Pending);
    }

    #[tokio::test]
    async fn test_fetch_pending_ordered_and_limited() {
        let pool = setup_test_db().await;
        for i in 1..=4 {
            insert_call(&pool, &format!("call-{i}"), "t").await.unwrap();
        }

        let mut conn = pool.acquire().await.unwrap();
        assert!(update_status(&mut conn, 2, CallStatus::Failed).await.unwrap());
        drop(conn);

        let pending = fetch_pending(&pool, 2).await.unwrap();
        let ids: Vec<i64> = pending.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_update_status_only_from_pending() {
        let pool = setup_test_db().await;
        let id = insert_call(&pool, "call-1", "t").await.unwrap();

        let mut conn = pool.acquire().await.unwrap();
        assert!(update_status(&mut conn, id, CallStatus::Processed).await.unwrap());
        assert!(!update_status(&mut conn, id, CallStatus::Failed).await.unwrap());
        drop(conn);

        let call = load_call(&pool, id).await.unwrap().unwrap();
        assert_eq!(call.status, CallStatus::Processed);
    }

    #[tokio::test]
    async fn test_count_by_status() {
        let pool = setup_test_db().await;
        for i in 1..=3 {
            insert_call(&pool, &format!("call-{i}"), "t").await.unwrap();
        }
        let mut conn = pool.acquire().await.unwrap();
        update_status(&mut conn, 1, CallStatus::ProcessedNoSegment).await.unwrap();
        drop(conn);

        let counts = count_by_status(&pool).await.unwrap();
        assert_eq!(counts.get(&CallStatus::Pending), Some(&2));
        assert_eq!(counts.get(&CallStatus::ProcessedNoSegment), Some(&1));
        assert_eq!(counts.get(&CallStatus::Failed), None);
    }
}
